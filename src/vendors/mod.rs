//! Clients for the outside services the API leans on: a text-generation
//! model, a speech synthesizer and an object store for the audio it produces.
//!
//! Handlers only see the traits, so tests swap in fakes and deployments can
//! point the HTTP clients at any compatible provider.

mod llm;
mod storage;
mod tts;

pub use llm::{DEFAULT_LLM_MODEL, DEFAULT_LLM_URL, OpenAiChatClient, OpenAiChatConfig};
pub use storage::FsObjectStore;
pub use tts::{DEFAULT_TTS_URL, DEFAULT_VOICE_ID, ElevenLabsClient, ElevenLabsConfig};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VendorError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Vendor returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Vendor returned no usable content")]
    EmptyResponse,
    #[error("Storage write failed: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

impl VendorError {
    /// Whether the failure happened while storing an object
    pub fn is_storage(&self) -> bool {
        matches!(self, VendorError::Storage(_) | VendorError::InvalidKey(_))
    }
}

/// A chat-style language model
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one system prompt and one user prompt, returning the reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, VendorError>;
}

/// Turns text into MP3 audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError>;
}

/// Stores blobs and hands back the URL they are publicly reachable at
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, VendorError>;
}

/// Turns a non-2xx response into a `VendorError::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VendorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VendorError::Status { status: status.as_u16(), body })
}
