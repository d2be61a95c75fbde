// HTTP server module
// Question answering over HTTP for a shared pipeline

#[cfg(test)]
mod tests;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

use crate::rag::{ImageRef, RagPipeline, Requester};
use crate::store::MetadataRecord;
use crate::{RagError, Result};

pub const BANNER: &str = "College RAG chatbot API is running!";

const DEFAULT_ROLE: &str = "student";
const DEFAULT_USER_NAME: &str = "Student";

/// State shared by every request.
///
/// Requests only read the pipeline, so any number of them proceed in
/// parallel; the write half of the lock is left to whoever owns the server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RwLock<RagPipeline>>,
    pub max_sources: usize,
}

impl AppState {
    #[inline]
    pub fn new(pipeline: RagPipeline, max_sources: usize) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(pipeline)),
            max_sources,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    pub role: Option<String>,
    pub user_name: Option<String>,
}

impl AskRequest {
    /// Either identity field on its own still produces a requester
    fn requester(&self) -> Option<Requester> {
        if self.role.is_none() && self.user_name.is_none() {
            return None;
        }
        Some(Requester::new(
            self.role.as_deref().unwrap_or(DEFAULT_ROLE),
            self.user_name.as_deref().unwrap_or(DEFAULT_USER_NAME),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<MetadataRecord>,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

#[inline]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/ask", post(ask_handler))
        .with_state(state)
}

async fn home_handler() -> &'static str {
    BANNER
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected /ask body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if request.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No question provided");
    }

    let requester = request.requester();
    let question = request.question;
    let pipeline = Arc::clone(&state.pipeline);
    let query = question.clone();
    let answered = tokio::task::spawn_blocking(move || {
        let pipeline = pipeline
            .read()
            .map_err(|_| RagError::Store("Pipeline lock poisoned".to_string()))?;
        Ok::<_, RagError>(pipeline.generate_answer(&query, None, requester.as_ref()))
    })
    .await;

    match answered {
        Ok(Ok(mut result)) => {
            result.sources.truncate(state.max_sources);
            Json(AskResponse {
                question,
                answer: result.answer,
                sources: result.sources,
                images: result.images,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            error!("Failed to answer '{}': {}", question, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!("Answer task failed for '{}': {}", question, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Serve until Ctrl-C
#[inline]
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
