//! HTTP-level tests for the chat API, driven by the mock LLM client and an
//! in-process retriever.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docuchat_core::index::{ContextChunk, IndexRegistry, StaticRetriever};
use docuchat_core::llm::{LlmClient, MockLlmClient, MockStep};
use docuchat_core::models::{ModelSettings, Role, DEFAULT_MODEL};
use docuchat_server::http::router::build_router;
use docuchat_server::http::HttpConfig;
use docuchat_server::AppCore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(mock: MockLlmClient) -> (Router, Arc<Mutex<Vec<ModelSettings>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_factory = seen.clone();

    let mut registry = IndexRegistry::with_llm_factory(move |settings| {
        seen_by_factory
            .lock()
            .expect("settings lock")
            .push(settings.clone());
        Arc::new(mock.clone()) as Arc<dyn LlmClient>
    });
    registry.register(
        "docs",
        Arc::new(StaticRetriever::new(vec![ContextChunk {
            text: "Widgets ship on Tuesdays.".to_string(),
            score: 0.9,
        }])),
    );

    let core = AppCore::new(registry);
    (build_router(core, &HttpConfig::default()), seen)
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.expect("body should collect").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

#[tokio::test]
async fn missing_datasource_is_rejected_before_streaming() {
    let (app, _) = test_app(MockLlmClient::new("mock-model"));

    let response = app
        .oneshot(post_chat(json!({ "message": "Hi" })))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/json"));

    let body: Value = serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body, json!({ "detail": "No datasource provided" }));
}

#[tokio::test]
async fn empty_datasource_is_rejected_too() {
    let (app, _) = test_app(MockLlmClient::new("mock-model"));

    let response = app
        .oneshot(post_chat(json!({ "message": "Hi", "datasource": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn streams_tokens_then_done() {
    let mock = MockLlmClient::from_steps(
        "mock-model",
        vec![MockStep::fragments(["Hello", ", ", "world"])],
    );
    let (app, _) = test_app(mock);

    let response = app
        .oneshot(post_chat(json!({
            "message": "Hi",
            "datasource": "docs",
            "embeddings": [{ "text": "unused", "embedding": [0.1, 0.2] }],
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let body = body_string(response.into_body()).await;
    assert_eq!(
        body,
        "data: \"Hello\"\n\ndata: \", \"\n\ndata: \"world\"\n\ndata: {\"done\":true}\n\n"
    );
}

#[tokio::test]
async fn history_and_config_reach_the_engine() {
    let mock = MockLlmClient::from_steps("mock-model", vec![MockStep::text("ok")]);
    let (app, seen) = test_app(mock.clone());

    let response = app
        .oneshot(post_chat(json!({
            "message": "When do they ship?",
            "datasource": "docs",
            "messages": [
                { "role": "user", "content": "What do you sell?" },
                { "role": "assistant", "content": "Widgets." },
            ],
            "config": { "model": "gpt-4o", "temperature": 0.2, "topP": 0.9, "sendMemory": true },
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let _ = body_string(response.into_body()).await;

    let settings = seen.lock().unwrap().clone();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].model, "gpt-4o");
    assert_eq!(settings[0].temperature, Some(0.2));
    assert_eq!(settings[0].max_tokens, Some(2000));

    let prompts = mock.prompts().await;
    assert_eq!(prompts.len(), 1);
    let messages = &prompts[0].messages;

    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("Widgets ship on Tuesdays."));
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "What do you sell?");
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "Widgets.");
    assert_eq!(messages[3].role, Role::User);
    assert_eq!(messages[3].content, "When do they ship?");
}

#[tokio::test]
async fn absent_config_resolves_to_the_default_model() {
    let mock = MockLlmClient::from_steps("mock-model", vec![MockStep::text("ok")]);
    let (app, seen) = test_app(mock);

    let response = app
        .oneshot(post_chat(json!({ "message": "Hi", "datasource": "docs" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let _ = body_string(response.into_body()).await;

    let settings = seen.lock().unwrap().clone();
    assert_eq!(settings[0].model, DEFAULT_MODEL);
    assert_eq!(settings[0].temperature, None);
    assert_eq!(settings[0].max_tokens, None);
}

#[tokio::test]
async fn unknown_datasource_is_an_internal_error() {
    let (app, _) = test_app(MockLlmClient::new("mock-model"));

    let response = app
        .oneshot(post_chat(json!({ "message": "Hi", "datasource": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body, json!({ "detail": "Datasource not found: nope" }));
}

#[tokio::test]
async fn unknown_role_fails_request_parsing() {
    let (app, _) = test_app(MockLlmClient::new("mock-model"));

    let response = app
        .oneshot(post_chat(json!({
            "message": "Hi",
            "datasource": "docs",
            "messages": [{ "role": "moderator", "content": "x" }],
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn model_failure_mid_stream_emits_error_frame_then_done() {
    let mock = MockLlmClient::from_steps("mock-model", vec![MockStep::error("boom")]);
    let (app, _) = test_app(mock);

    let response = app
        .oneshot(post_chat(json!({ "message": "Hi", "datasource": "docs" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert_eq!(
        body,
        "data: {\"error\":\"LLM error: boom\"}\n\ndata: {\"done\":true}\n\n"
    );
}

#[tokio::test]
async fn health_check_responds() {
    let (app, _) = test_app(MockLlmClient::new("mock-model"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response.into_body()).await, "OK");
}
