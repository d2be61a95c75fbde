use super::*;
use crate::rag::PipelineSettings;
use crate::rag::testing::{HashingEmbedder, RecordingCompletion};
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;

const FACTS: [(&str, &str); 3] = [
    (
        "Hostel Fees",
        "Hostel fees are eighty thousand rupees per year including mess charges and laundry.",
    ),
    (
        "Library",
        "The central library opens at eight in the morning and closes at ten at night on weekdays.",
    ),
    (
        "Exams",
        "Semester examinations are held in November and April with results published online.",
    ),
];

fn test_state(completion: &RecordingCompletion) -> AppState {
    let mut pipeline = RagPipeline::new(
        Box::new(HashingEmbedder::new(384)),
        Some(Box::new(completion.clone())),
        PipelineSettings::default(),
    );
    for (title, text) in FACTS {
        pipeline.add_text(text, &MetadataRecord::titled(title));
    }
    AppState::new(pipeline, 2)
}

fn ask(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("json")))
        .expect("request")
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn home_returns_banner() {
    let app = build_router(test_state(&RecordingCompletion::replying("ok")));
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert_eq!(&bytes[..], BANNER.as_bytes());
}

#[tokio::test]
async fn ask_returns_answer_with_limited_sources() {
    let completion = RecordingCompletion::replying("Eighty thousand rupees.");
    let app = build_router(test_state(&completion));

    let response = app
        .oneshot(ask(&serde_json::json!({ "question": "What are the hostel fees per year?" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["question"], "What are the hostel fees per year?");
    assert_eq!(json["answer"], "Eighty thousand rupees.");
    assert_eq!(json["sources"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["sources"][0]["title"], "Hostel Fees");
    assert_eq!(json["images"], serde_json::json!([]));
    assert_eq!(completion.calls().len(), 1);
}

#[tokio::test]
async fn ask_passes_requester_to_prompt() {
    let completion = RecordingCompletion::replying("ok");
    let app = build_router(test_state(&completion));

    let response = app
        .oneshot(ask(&serde_json::json!({
            "question": "When are exams held?",
            "role": "faculty",
            "user_name": "Dr. Rao",
        })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let calls = completion.calls();
    assert!(calls[0].messages[1]
        .content
        .contains("(from Dr. Rao, role faculty)"));
}

#[tokio::test]
async fn empty_question_is_bad_request() {
    let completion = RecordingCompletion::replying("ok");

    for body in [
        serde_json::json!({ "question": "" }),
        serde_json::json!({ "question": "   " }),
        serde_json::json!({}),
    ] {
        let app = build_router(test_state(&completion));
        let response = app.oneshot(ask(&body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No question provided");
    }
    assert!(completion.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = build_router(test_state(&RecordingCompletion::replying("ok")));
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn completion_failure_is_reported_in_answer() {
    let app = build_router(test_state(&RecordingCompletion::failing()));

    let response = app
        .oneshot(ask(&serde_json::json!({ "question": "When does the library open?" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["answer"]
        .as_str()
        .is_some_and(|a| a.starts_with("Error generating response:")));
    assert_eq!(json["sources"].as_array().map(Vec::len), Some(2));
}

#[test]
fn requester_defaults_missing_identity_fields() {
    let request: AskRequest =
        serde_json::from_str(r#"{"question":"q","role":"warden"}"#).expect("parse");
    assert_eq!(
        request.requester(),
        Some(Requester::new("warden", DEFAULT_USER_NAME))
    );

    let request: AskRequest = serde_json::from_str(r#"{"question":"q"}"#).expect("parse");
    assert_eq!(request.requester(), None);
}

#[tokio::test]
async fn question_is_echoed_as_submitted() {
    let app = build_router(test_state(&RecordingCompletion::replying("At ten.")));

    let response = app
        .oneshot(ask(&serde_json::json!({ "question": "  When do hostel gates close?\n" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["question"], "  When do hostel gates close?\n");
    assert_eq!(json["answer"], "At ten.");
}
