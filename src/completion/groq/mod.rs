
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{ChatMessage, CompletionModel, CompletionRequest};
use crate::config::CompletionConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Client for the Groq chat completions API, or any OpenAI-compatible endpoint
#[derive(Clone)]
pub struct GroqClient {
    completions_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("completions_url", &self.completions_url.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GroqClient {
    #[inline]
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(anyhow::anyhow!("No API key configured for the completion API"));
        }

        let completions_url = completions_url(&config.base_url)?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            completions_url,
            model: config.model.clone(),
            api_key: config.effective_api_key().to_string(),
            agent,
        })
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        self
    }
}

impl CompletionModel for GroqClient {
    #[inline]
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            "Requesting completion from {} ({} messages)",
            self.model,
            request.messages.len()
        );

        let body = serde_json::to_string(&ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        })
        .context("Failed to serialize completion request")?;

        let mut response = self
            .agent
            .post(self.completions_url.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(&body)
            .context("Completion request failed")?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read completion response")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!("Completion API returned HTTP {}: {}", status.as_u16(), detail);
            return Err(anyhow::anyhow!(
                "Completion API returned HTTP {}: {}",
                status.as_u16(),
                detail
            ));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).context("Failed to parse completion response")?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Completion response contained no message")?;

        debug!("Received completion ({} chars)", answer.len());
        Ok(answer)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}

fn completions_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .with_context(|| format!("Invalid completion base URL: {}", base_url))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .context("Failed to build completions URL")
}
