//! Common test utilities for EnzoLearn integration tests
//!
//! This file contains the application setup shared by all integration
//! tests: stand-in vendor clients, a fresh in-memory database per app, and
//! helpers for registering users and sending JSON requests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use enzolearn::{
    AppState, Limits,
    auth::TokenIssuer,
    create_app,
    db::init_pool,
    vendors::{ObjectStore, SpeechSynthesizer, TextGenerator, VendorError},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::Service;

pub const MEDIA_URL: &str = "http://media.test/media";

/// Answers every prompt with a fixed reply
pub struct CannedTextGenerator(pub Option<String>);

#[async_trait]
impl TextGenerator for CannedTextGenerator {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, VendorError> {
        self.0
            .clone()
            .ok_or(VendorError::Status { status: 500, body: "model offline".to_string() })
    }
}

/// Returns the text itself as the "audio"
pub struct EchoSpeech;

#[async_trait]
impl SpeechSynthesizer for EchoSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError> {
        Ok(text.as_bytes().to_vec())
    }
}

/// Keeps stored objects in memory
#[derive(Default)]
pub struct InMemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, VendorError> {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("{MEDIA_URL}/{key}"))
    }
}

/// A running test application and the state behind it
pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryStore>,
}

/// Creates a test application with an in-memory SQLite database
///
/// Each call gets its own database, so tests are isolated from each other
/// and need no cleanup. The language model answers with `llm_reply`, or
/// fails when it is `None`.
pub fn create_test_app_with(llm_reply: Option<&str>) -> TestApp {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&database_url).unwrap();
    {
        let conn = &mut pool.get().unwrap();
        enzolearn::run_migrations(conn).unwrap();
    }

    let store = Arc::new(InMemoryStore::default());
    let state = Arc::new(AppState {
        pool,
        tokens: TokenIssuer::new("integration_test_secret_of_decent_length", chrono::Duration::hours(1)),
        text_generator: Arc::new(CannedTextGenerator(llm_reply.map(str::to_string))),
        speech: Arc::new(EchoSpeech),
        store: store.clone(),
        limits: Limits::default(),
        media_dir: std::env::temp_dir(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        rate_limit: None,
    });

    TestApp { app: create_app(state.clone()), state, store }
}

/// Creates a test application whose language model always says "ok"
pub fn create_test_app() -> TestApp {
    create_test_app_with(Some("ok"))
}

/// Sends a JSON request and returns the status and parsed envelope
pub async fn send(
    app: &mut Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.call(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

/// Registers a user through the API and returns their token
pub async fn register_user(app: &mut Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"name": "Test Student", "email": email, "password": "correct horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Creates a collection through the API and returns its ID
pub async fn create_collection(app: &mut Router, token: &str, title: &str) -> String {
    let (status, body) = send(app, "POST", "/api/collections", Some(token), Some(json!({"title": title}))).await;
    assert_eq!(status, StatusCode::CREATED, "create collection failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Creates a study item through the API and returns the response data
pub async fn create_study_item(app: &mut Router, token: &str, collection_id: &str, item_type: &str, content: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/study-items",
        Some(token),
        Some(json!({
            "title": format!("A {item_type}"),
            "content": content,
            "type": item_type,
            "collection_id": collection_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create study item failed: {body}");
    body["data"].clone()
}
