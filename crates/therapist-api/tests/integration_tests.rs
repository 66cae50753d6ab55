//! Integration tests for the therapist relay API.
//!
//! Each test builds its own router and in-memory state. Model behavior is
//! scripted through a stub `GenerativeModel`, except for the end-to-end
//! test which runs the real Gemini client against a local fake upstream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use therapist_api::create_router;
use therapist_api::error::ErrorBody;
use therapist_api::handlers::{HealthResponse, SessionsResponse};
use therapist_api::state::AppState;
use therapist_chat::{ChatError, GeminiClient, GenerativeModel, TranscriptView};
use therapist_core::{Animation, ChatResponseBody, FacialExpression, Role, TherapistConfig};

// =============================================================================
// Helpers
// =============================================================================

const REPLY: &str = r#"```json
[
  {"text": "I'm sorry you're feeling anxious.", "facialExpression": "default", "animation": "Talking"},
  {"text": "When did it start?", "facialExpression": "smile", "animation": "Idle"}
]
```"#;

struct StubModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl GenerativeModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn make_state(model: Option<Arc<dyn GenerativeModel>>) -> AppState {
    AppState::new(TherapistConfig::default(), model)
}

fn make_app() -> axum::Router {
    create_router(make_state(Some(StubModel::new(REPLY))))
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn chat(app: &axum::Router, json: &str) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(post_json("/chat", json)).await.unwrap();
    let status = resp.status();
    (status, body_bytes(resp).await)
}

fn greeting_texts(body: &ChatResponseBody) -> Vec<(&str, Animation)> {
    body.messages
        .iter()
        .map(|m| (m.text.as_str(), m.animation))
        .collect()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_root_greeting() {
    let resp = make_app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"Hello World!");
}

#[tokio::test]
async fn test_health() {
    let resp = make_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.sessions, 0);
    assert!(health.upstream_configured);
}

#[tokio::test]
async fn test_health_reports_missing_upstream() {
    let app = create_router(make_state(None));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(!health.upstream_configured);
}

// =============================================================================
// POST /chat - canned replies
// =============================================================================

#[tokio::test]
async fn test_chat_without_message_returns_greeting_pair() {
    let app = make_app();
    for json in ["{}", r#"{"message": ""}"#, r#"{"message": null}"#, ""] {
        let (status, bytes) = chat(&app, json).await;
        assert_eq!(status, StatusCode::OK, "body {:?}", json);
        let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            greeting_texts(&body),
            vec![
                ("How are you feeling today?", Animation::Talking),
                ("How are you feeling today?", Animation::Meeting),
            ]
        );
        assert!(body.session_id.is_none());
    }
}

#[tokio::test]
async fn test_chat_without_credential_returns_fallback() {
    let app = create_router(make_state(None));
    let (status, bytes) = chat(&app, r#"{"message": "I feel anxious"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        greeting_texts(&body),
        vec![("How are you feeling today?", Animation::Meeting)]
    );

    // No session was created for the unanswered message.
    let resp = app
        .oneshot(Request::get("/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let sessions: SessionsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(sessions.sessions.is_empty());
}

// =============================================================================
// POST /chat - relayed replies
// =============================================================================

#[tokio::test]
async fn test_chat_happy_path_shape() {
    let app = make_app();
    let (status, bytes) = chat(&app, r#"{"message": "I feel anxious"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let raw: Value = serde_json::from_slice(&bytes).unwrap();
    let messages = raw["messages"].as_array().unwrap();
    assert!(!messages.is_empty() && messages.len() <= 3);
    for m in messages {
        assert!(!m["text"].as_str().unwrap().is_empty());
        assert!(["smile", "default"].contains(&m["facialExpression"].as_str().unwrap()));
        assert!(["Idle", "Talking"].contains(&m["animation"].as_str().unwrap()));
    }
    assert!(raw["sessionId"].is_string());
}

#[tokio::test]
async fn test_chat_records_transcript() {
    let app = make_app();
    let (_, bytes) = chat(&app, r#"{"message": "I feel anxious"}"#).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    let sid = body.session_id.unwrap();

    let resp = app
        .oneshot(
            Request::get(format!("/sessions/{}", sid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let view: TranscriptView = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(view.turns.len(), 3);
    assert_eq!(view.turns[0].role, Role::User);
    assert_eq!(view.turns[0].text, "I feel anxious");
    assert!(view.turns[1..].iter().all(|t| t.role == Role::Therapist));
}

#[tokio::test]
async fn test_chat_session_continuity_and_isolation() {
    let model = StubModel::new(REPLY);
    let app = create_router(make_state(Some(model.clone())));

    let (_, a) = chat(&app, r#"{"message": "alpha private"}"#).await;
    let a: ChatResponseBody = serde_json::from_slice(&a).unwrap();
    let sid_a = a.session_id.unwrap();

    let (_, b) = chat(&app, r#"{"message": "bravo"}"#).await;
    let b: ChatResponseBody = serde_json::from_slice(&b).unwrap();
    assert_ne!(b.session_id.unwrap(), sid_a);

    let follow_up = format!(r#"{{"message": "alpha again", "sessionId": "{}"}}"#, sid_a);
    let (_, c) = chat(&app, &follow_up).await;
    let c: ChatResponseBody = serde_json::from_slice(&c).unwrap();
    assert_eq!(c.session_id, Some(sid_a));

    let prompts = model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[1].contains("alpha private"));
    assert!(prompts[2].contains("User: alpha private"));
    assert!(!prompts[2].contains("bravo"));
}

#[tokio::test]
async fn test_chat_malformed_model_reply_is_500() {
    let app = create_router(make_state(Some(StubModel::new("```json\n[{\"text\": ]\n```"))));
    let (status, bytes) = chat(&app, r#"{"message": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "Failed to generate response");
    assert!(serde_json::from_slice::<Value>(&bytes).unwrap()["messages"].is_null());
}

#[tokio::test]
async fn test_chat_invalid_enum_from_model_is_500() {
    let reply = r#"[{"text": "hi", "facialExpression": "wink", "animation": "Idle"}]"#;
    let app = create_router(make_state(Some(StubModel::new(reply))));
    let (status, _) = chat(&app, r#"{"message": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_chat_invalid_json_body_is_400() {
    let (status, bytes) = chat(&make_app(), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.code, "bad_request");
}

#[tokio::test]
async fn test_chat_message_too_long_is_400() {
    let long = "a".repeat(2001);
    let (status, _) = chat(&make_app(), &format!(r#"{{"message": "{}"}}"#, long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_unknown_session_is_404() {
    let resp = make_app()
        .oneshot(
            Request::get(format!("/sessions/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session() {
    let app = make_app();
    let (_, bytes) = chat(&app, r#"{"message": "hello"}"#).await;
    let sid = serde_json::from_slice::<ChatResponseBody>(&bytes)
        .unwrap()
        .session_id
        .unwrap();

    let delete = || {
        Request::delete(format!("/sessions/{}", sid))
            .body(Body::empty())
            .unwrap()
    };
    let resp = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(delete()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_sessions() {
    let app = make_app();
    chat(&app, r#"{"message": "one"}"#).await;
    chat(&app, r#"{"message": "two"}"#).await;

    let resp = app
        .oneshot(Request::get("/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let sessions: SessionsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(sessions.sessions.len(), 2);
    assert!(sessions.sessions.iter().all(|s| s.turn_count == 3));
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let mut config = TherapistConfig::default();
    config.server.rate_limit_per_sec = 1;
    let app = create_router(AppState::new(config, Some(StubModel::new(REPLY))));

    let mut statuses = Vec::new();
    for _ in 0..5 {
        statuses.push(chat(&app, "{}").await.0);
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_health_not_rate_limited() {
    let mut config = TherapistConfig::default();
    config.server.rate_limit_per_sec = 1;
    let app = create_router(AppState::new(config, None));

    for _ in 0..5 {
        let resp = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

// =============================================================================
// End to end against a fake upstream
// =============================================================================

async fn spawn_fake_upstream(reply_text: &'static str) -> String {
    use axum::routing::post;
    use axum::Json;

    let app = axum::Router::new().route(
        "/v1beta/models/{model}",
        post(move |Json(body): Json<Value>| async move {
            assert!(body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .ends_with("Therapist:"));
            Json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": reply_text }] } }]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1beta", addr)
}

#[tokio::test]
async fn test_end_to_end_with_gemini_client() {
    let base_url = spawn_fake_upstream(REPLY).await;
    let client = GeminiClient::new(
        "test-key".to_string(),
        &base_url,
        "gemini-1.5-flash",
        Duration::from_secs(5),
    );
    let app = create_router(make_state(Some(Arc::new(client))));

    let (status, bytes) = chat(&app, r#"{"message": "I feel anxious"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.messages.len(), 2);
    assert_eq!(body.messages[0].facial_expression, FacialExpression::Default);
    assert_eq!(body.messages[1].text, "When did it start?");
}

#[tokio::test]
async fn test_end_to_end_wrapped_reply() {
    let base_url = spawn_fake_upstream(
        r#"{"messages": [{"text": "Hello there.", "facialExpression": "smile", "animation": "Talking"}]}"#,
    )
    .await;
    let client = GeminiClient::new(
        "test-key".to_string(),
        &base_url,
        "gemini-1.5-flash",
        Duration::from_secs(5),
    );
    let app = create_router(make_state(Some(Arc::new(client))));

    let (status, bytes) = chat(&app, r#"{"message": "hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.messages.len(), 1);
    assert_eq!(body.messages[0].text, "Hello there.");
}

#[tokio::test]
async fn test_end_to_end_hung_upstream_is_500() {
    use axum::routing::post;

    let upstream = axum::Router::new().route(
        "/v1beta/models/{model}",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    let client = GeminiClient::new(
        "test-key".to_string(),
        &format!("http://{}/v1beta", addr),
        "gemini-1.5-flash",
        Duration::from_secs(1),
    );
    let state = make_state(Some(Arc::new(client)));
    let app = create_router(state.clone());

    let (status, bytes) = chat(&app, r#"{"message": "are you there?"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "Failed to generate response");
    assert_eq!(state.orchestrator.session_count(), 0);
}
