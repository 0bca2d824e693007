use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{SpeechSynthesizer, VendorError, check_status};

pub const DEFAULT_TTS_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_TTS_MODEL: &str = "eleven_monolingual_v1";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub timeout_seconds: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TTS_URL.to_string(),
            api_key: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_TTS_MODEL.to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
            timeout_seconds: 60,
        }
    }
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Text-to-speech over the ElevenLabs REST API
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, VendorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    #[instrument(skip_all, fields(voice = %self.config.voice_id, text_len = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError> {
        let request = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        );
        let mut builder = self.client.post(url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("xi-api-key", key);
        }

        let response = check_status(builder.send().await?).await?;
        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(VendorError::EmptyResponse);
        }

        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
