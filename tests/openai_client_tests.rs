use coach_relay::config::{ApiKey, AppConfig};
use coach_relay::routes::create_router;
use coach_relay::services::openai::{
    CompletionProvider, CompletionRequest, OpenAiClient, UpstreamError,
};
use coach_relay::state::AppState;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

#[derive(Clone)]
struct MockOpenAi {
    status: StatusCode,
    reply: &'static str,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn mock_completions(
    State(mock): State<MockOpenAi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    mock.seen.lock().unwrap().push((authorization, body));
    (
        mock.status,
        [(header::CONTENT_TYPE, "application/json")],
        mock.reply,
    )
}

async fn spawn_mock_openai(status: StatusCode, reply: &'static str) -> (String, MockOpenAi) {
    let mock = MockOpenAi {
        status,
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(mock_completions))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), mock)
}

fn sample_request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4o-mini".to_string(),
        temperature: 0.2,
        messages: vec![json!({ "role": "user", "content": "Rate my move" })],
        max_tokens: 600,
    }
}

#[tokio::test]
async fn sends_credential_and_body() {
    let (base_url, mock) = spawn_mock_openai(
        StatusCode::OK,
        r#"{"choices":[{"message":{"role":"assistant","content":" Nice opening. "}}]}"#,
    )
    .await;
    let client = OpenAiClient::new(base_url);

    let completion = client
        .complete(&ApiKey::new("sk-test"), &sample_request())
        .await
        .unwrap();
    assert_eq!(completion.first_reply(), "Nice opening.");

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer sk-test"));
    assert_eq!(
        seen[0].1,
        json!({
            "model": "gpt-4o-mini",
            "temperature": 0.2,
            "messages": [{ "role": "user", "content": "Rate my move" }],
            "max_tokens": 600
        })
    );
}

#[tokio::test]
async fn error_status_is_reported() {
    let (base_url, _mock) = spawn_mock_openai(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"quota exceeded"}}"#,
    )
    .await;
    let client = OpenAiClient::new(base_url);

    let err = client
        .complete(&ApiKey::new("sk-test"), &sample_request())
        .await
        .unwrap_err();

    match err {
        UpstreamError::Status { status, body } => {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert!(body.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (base_url, _mock) = spawn_mock_openai(StatusCode::OK, "<html>gateway</html>").await;
    let client = OpenAiClient::new(base_url);

    let err = client
        .complete(&ApiKey::new("sk-test"), &sample_request())
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamError::Decode(_)));
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    let client = OpenAiClient::new("http://127.0.0.1:1/v1");

    let err = client
        .complete(&ApiKey::new("sk-test"), &sample_request())
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamError::Transport(_)));
}

#[tokio::test]
async fn relay_end_to_end() {
    let (base_url, mock) = spawn_mock_openai(
        StatusCode::OK,
        r#"{"choices":[{"message":{"content":"  Good job!  "}}]}"#,
    )
    .await;
    let config = AppConfig {
        openai_api_key: Some(ApiKey::new("sk-server-side")),
        openai_base_url: base_url.clone(),
        ..AppConfig::default()
    };
    let state = Arc::new(AppState::new(config, Arc::new(OpenAiClient::new(base_url))));
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"messages": [{"role": "user", "content": "How did I do?"}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body, json!({ "ok": true, "reply": "Good job!" }));
    assert!(!String::from_utf8_lossy(&body_bytes).contains("sk-server-side"));

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen[0].0.as_deref(), Some("Bearer sk-server-side"));
    assert_eq!(seen[0].1["max_tokens"], 600);
}
