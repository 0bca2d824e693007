use anyhow::Context;
use clap::Parser;
use rand::{Rng, distr::Alphanumeric};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use enzolearn::auth::TokenIssuer;
use enzolearn::config::{CliArgs, Config, get_config};
use enzolearn::vendors::{
    ElevenLabsClient, ElevenLabsConfig, FsObjectStore, OpenAiChatClient, OpenAiChatConfig,
};
use enzolearn::rate_limit::RateLimit;
use enzolearn::{AppState, Limits, create_app, db, logging, run_migrations};

/// A per-process signing secret for when none is configured
///
/// Tokens signed with it stop working when the server restarts.
fn random_secret() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
}

fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = db::init_pool(&config.database_url).context("Failed to create database pool")?;
    {
        let mut conn = pool.get().context("Failed to get a database connection")?;
        run_migrations(&mut conn)?;
    }

    let secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("No JWT secret configured, using a random one; sessions will not survive a restart");
            random_secret()
        }
    };

    if config.llm_api_key.is_none() {
        warn!("No LLM API key configured, AI endpoints will fail unless the endpoint needs none");
    }
    let text_generator = OpenAiChatClient::new(OpenAiChatConfig {
        base_url: config.llm_base_url.clone(),
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
        ..OpenAiChatConfig::default()
    })?;

    if config.tts_api_key.is_none() {
        warn!("No text-to-speech API key configured, audio endpoints will fail");
    }
    let speech = ElevenLabsClient::new(ElevenLabsConfig {
        base_url: config.tts_base_url.clone(),
        api_key: config.tts_api_key.clone(),
        voice_id: config.tts_voice_id.clone(),
        ..ElevenLabsConfig::default()
    })?;

    let store = FsObjectStore::new(&config.media_dir, &config.public_base_url);
    let session_ttl = config.token_ttl().map_err(anyhow::Error::msg)?;
    let rate_limit = RateLimit::new(config.rate_limit_max, Duration::from_secs(config.rate_limit_window_secs));
    if rate_limit.is_none() {
        warn!("Rate limiting is disabled");
    }

    Ok(AppState {
        pool,
        tokens: TokenIssuer::new(&secret, session_ttl),
        text_generator: Arc::new(text_generator),
        speech: Arc::new(speech),
        store: Arc::new(store),
        limits: Limits {
            max_input_chars: config.max_input_chars,
            max_speech_chars: config.max_speech_chars,
        },
        media_dir: config.media_dir.clone().into(),
        cors_origins: config.cors_origins.clone(),
        rate_limit,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv::dotenv().is_ok() {
        println!("Loaded .env file");
    }

    let args = CliArgs::parse();
    let _log_guard = logging::init_tracing(args.log_dir.as_deref(), args.debug);

    let config = get_config(args);

    std::fs::create_dir_all(&config.media_dir)
        .with_context(|| format!("Failed to create media directory {}", config.media_dir))?;

    let state = Arc::new(build_state(&config)?);
    let app = create_app(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
