/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler extracts the request data, validates it, calls the
/// repository and vendor layers, and wraps the result in an `ApiResponse`.

mod auth_handlers;
mod collection_handlers;
mod study_item_handlers;
mod flashcard_handlers;
mod ai_handlers;
mod activity_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use collection_handlers::*;
pub use study_item_handlers::*;
pub use flashcard_handlers::*;
pub use ai_handlers::*;
pub use activity_handlers::*;

use axum::{Json, http::StatusCode};
use tracing::warn;

use crate::db::DbPool;
use crate::dto::ApiResponse;
use crate::models::Activity;
use crate::repo;

/// A 200 response carrying `data`
type Reply<T> = Json<ApiResponse<T>>;

/// A 201 response carrying `data`
type Created<T> = (StatusCode, Json<ApiResponse<T>>);

fn created<T>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

/// Appends to the activity log
///
/// The log is informational, so a failed insert does not fail the request.
fn log_activity(pool: &DbPool, activity: Activity) {
    if let Err(e) = repo::record_activity(pool, activity) {
        warn!(error = %e, "Failed to record activity");
    }
}

/// Milliseconds since the Unix epoch, used to make stored file names unique
fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reads `text` aloud and stores the MP3 under `key`, returning its public URL
///
/// The text is cut to the configured speech budget first.
async fn synthesize_and_store(state: &crate::AppState, text: &str, key: &str) -> Result<String, crate::errors::ApiError> {
    let text = crate::text::truncate_chars(text, state.limits.max_speech_chars);
    let audio = state.speech.synthesize(text).await?;
    let url = state.store.put(key, audio, "audio/mpeg").await?;
    Ok(url)
}
