/// EnzoLearn: a study-aid backend
///
/// Users keep collections of study items (notes, flashcards, quiz entries)
/// and flashcard sets, and can ask a language model to write flashcards,
/// summarize or tutor, or a speech synthesizer to read their material
/// aloud. Every response is wrapped in a `{ success, data?, error? }`
/// envelope.
///
/// ### Modules
///
/// - `db`: Database connection management
/// - `models`: Data structures stored in the database
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
/// - `auth`: Tokens, password hashing and the authenticated-user extractor
/// - `vendors`: Language model, speech and object storage clients
/// - `handlers`: The HTTP endpoints
/// - `dto`, `errors`: Request/response shapes and the error envelope
/// - `text`: Prompt building and model output parsing
/// - `config`, `logging`: Layered settings and the tracing subscriber
/// - `extract`, `rate_limit`: Enveloped request extractors and per-IP throttling
///
/// ### Web API
///
/// - `/api/auth`: register, login, profile, password reset, logout
/// - `/api/collections`: collection CRUD plus their items and flashcard sets
/// - `/api/study-items`: study item CRUD and audio generation
/// - `/api/flashcards`: flashcard set CRUD
/// - `/api/ai`: flashcard generation, summaries, tutoring, text to speech
/// - `/api/activity`: the activity log and study session recording
/// - `/media`: generated audio files

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod rate_limit;
pub mod repo;
pub mod schema;
pub mod text;
pub mod vendors;

#[cfg(test)]
mod test_utils;

use axum::{
    Json, Router, middleware,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::warn;

use auth::TokenIssuer;
use db::DbPool;
use dto::ApiResponse;
use handlers::*;
use rate_limit::{RateLimit, enforce_rate_limit};
use vendors::{ObjectStore, SpeechSynthesizer, TextGenerator};

/// How much text the vendor endpoints accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Characters of user text sent to the language model
    pub max_input_chars: usize,
    /// Characters sent to the speech synthesizer
    pub max_speech_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_input_chars: 12_000, max_speech_chars: 5_000 }
    }
}

/// Everything the handlers share
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenIssuer,
    pub text_generator: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub store: Arc<dyn ObjectStore>,
    pub limits: Limits,
    /// Directory served under `/media`
    pub media_dir: PathBuf,
    pub cors_origins: Vec<String>,
    /// Per-IP request budget; `None` turns throttling off
    pub rate_limit: Option<RateLimit>,
}

/// Hardening headers added to every response that does not set them itself
fn security_headers() -> [(HeaderName, HeaderValue); 6] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
    ]
}

fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    security_headers().into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(name, value))
    })
}

async fn welcome_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to EnzoLearn API" }))
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::failure("Route not found")))
}

/// Builds a CORS layer allowing the given origins with credentials
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The shared application state handed to every handler
///
/// ### Returns
///
/// An Axum Router with every endpoint, media serving, CORS, per-IP rate
/// limiting, security headers and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&state.media_dir);
    let cors = cors_layer(&state.cors_origins);

    let router = Router::new()
        .route("/", get(welcome_handler))
        // Authentication
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/user", get(get_current_user_handler).put(update_current_user_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .route("/api/auth/logout", post(logout_handler))
        // Collections
        .route("/api/collections", get(list_collections_handler).post(create_collection_handler))
        .route(
            "/api/collections/{id}",
            get(get_collection_handler)
                .put(update_collection_handler)
                .delete(delete_collection_handler),
        )
        .route("/api/collections/{id}/items", get(list_collection_items_handler))
        .route("/api/collections/{id}/flashcards", get(list_collection_flashcards_handler))
        // Study items
        .route("/api/study-items", post(create_study_item_handler))
        .route(
            "/api/study-items/{id}",
            get(get_study_item_handler)
                .put(update_study_item_handler)
                .delete(delete_study_item_handler),
        )
        .route("/api/study-items/{id}/audio", post(generate_study_item_audio_handler))
        // Flashcard sets
        .route("/api/flashcards", get(list_flashcard_sets_handler).post(create_flashcard_set_handler))
        .route(
            "/api/flashcards/{id}",
            get(get_flashcard_set_handler)
                .put(update_flashcard_set_handler)
                .delete(delete_flashcard_set_handler),
        )
        // AI
        .route("/api/ai/flashcards", post(generate_flashcards_handler))
        .route("/api/ai/summarize", post(summarize_handler))
        .route("/api/ai/tutor", post(tutor_handler))
        .route("/api/ai/text-to-speech", post(text_to_speech_handler))
        // Activity
        .route("/api/activity", get(list_activity_handler))
        .route("/api/activity/study", post(record_study_handler))
        .nest_service("/media", media)
        .fallback(not_found_handler);

    let router = match state.rate_limit.as_ref().and_then(RateLimit::limiter) {
        Some(limiter) => router.layer(middleware::from_fn_with_state(limiter, enforce_rate_limit)),
        None => router,
    };

    with_security_headers(router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// ### Errors
///
/// Returns an error if any pending migration fails to apply.
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    Ok(())
}
