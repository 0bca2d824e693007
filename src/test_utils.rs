use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::auth::TokenIssuer;
use crate::models::User;
use crate::repo::tests::{create_test_user, setup_test_db};
use crate::vendors::{ObjectStore, SpeechSynthesizer, TextGenerator, VendorError};
use crate::{AppState, Limits};

pub const TEST_SECRET: &str = "test_secret_key_that_is_long_enough_for_hs256";
pub const TEST_MEDIA_URL: &str = "http://test.local/media";

/// A language model that answers every prompt with the same text
#[derive(Default)]
pub struct FakeTextGenerator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl FakeTextGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    /// Fails every call with a 503
    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, VendorError> {
        self.prompts.lock().unwrap().push((system.to_string(), prompt.to_string()));
        self.reply
            .clone()
            .ok_or(VendorError::Status { status: 503, body: "unavailable".to_string() })
    }
}

/// A synthesizer that records what it was asked to read
#[derive(Default)]
pub struct FakeSpeech {
    fail: bool,
    pub texts: Mutex<Vec<String>>,
}

impl FakeSpeech {
    pub fn failing() -> Self {
        Self { fail: true, texts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(VendorError::Status { status: 401, body: "bad key".to_string() });
        }
        Ok(b"ID3fake-mp3".to_vec())
    }
}

/// Keeps stored objects in memory
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, VendorError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("{TEST_MEDIA_URL}/{key}"))
    }
}

/// Builds application state over a fresh database with the given fakes
pub fn test_state_with(
    text_generator: Arc<FakeTextGenerator>,
    speech: Arc<FakeSpeech>,
    store: Arc<MemoryStore>,
) -> Arc<AppState> {
    Arc::new(AppState {
        pool: setup_test_db(),
        tokens: TokenIssuer::new(TEST_SECRET, chrono::Duration::hours(168)),
        text_generator,
        speech,
        store,
        limits: Limits::default(),
        media_dir: std::env::temp_dir().join(format!("enzolearn_media_{}", uuid::Uuid::new_v4())),
        cors_origins: vec!["http://localhost:3000".to_string()],
        rate_limit: None,
    })
}

/// Builds application state with well-behaved fakes
pub fn test_state() -> Arc<AppState> {
    test_state_with(
        Arc::new(FakeTextGenerator::replying("ok")),
        Arc::new(FakeSpeech::default()),
        Arc::new(MemoryStore::default()),
    )
}

/// Creates a user and returns it with a valid bearer token
pub fn signed_in_user(state: &AppState, email: &str) -> (User, String) {
    let user = create_test_user(&state.pool, email);
    let token = state.tokens.issue_session(user.get_id()).unwrap();
    (user, token)
}

/// Builds a request with an optional bearer token and optional JSON body
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
