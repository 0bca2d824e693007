use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{Created, Reply, created, log_activity, synthesize_and_store, timestamp_millis};
use crate::AppState;
use crate::auth::AuthUser;
use crate::dto::{ApiResponse, AudioUrlDto, CreateStudyItemDto, UpdateStudyItemDto, non_blank};
use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::models::{Activity, ActivityType, StudyItem, StudyItemType};
use crate::repo;
use crate::text::speech_text;

const STUDY_ITEM_NOT_FOUND: &str = "Study item not found";

fn parse_item_type(value: &str) -> Result<StudyItemType, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid type: {value}. Expected note, flashcard, or quiz")))
}

/// Handler for `GET /api/study-items/{id}`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn get_study_item_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<String>,
) -> Result<Reply<StudyItem>, ApiError> {
    let item = repo::get_study_item(&state.pool, user.get_id(), &item_id)?
        .ok_or(ApiError::NotFound(STUDY_ITEM_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok(item)))
}

/// Handler for creating a study item
///
/// This function handles POST requests to `/api/study-items`. The target
/// collection must belong to the caller.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn create_study_item_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateStudyItemDto>,
) -> Result<Created<StudyItem>, ApiError> {
    let (Some(title), Some(content), Some(item_type), Some(collection_id)) = (
        non_blank(payload.title),
        non_blank(payload.content),
        non_blank(payload.item_type),
        non_blank(payload.collection_id),
    ) else {
        return Err(ApiError::bad_request("Please provide title, content, type, and collection_id"));
    };
    let item_type = parse_item_type(&item_type)?;

    repo::get_collection(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound("Collection not found"))?;

    let item = repo::create_study_item(
        &state.pool,
        StudyItem::new(
            user.get_id(),
            &collection_id,
            item_type,
            title,
            content,
            payload.tags.unwrap_or_default(),
        ),
    )?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Create, item_type.as_str(), item.get_id(), item.get_title())
            .in_collection(Some(&collection_id)),
    );

    info!("Created study item {}", item.get_id());
    Ok(created(item))
}

/// Handler for `PUT /api/study-items/{id}`
///
/// Leaving out `tags` keeps the current tags.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn update_study_item_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateStudyItemDto>,
) -> Result<Reply<StudyItem>, ApiError> {
    let (Some(title), Some(content), Some(item_type)) =
        (non_blank(payload.title), non_blank(payload.content), non_blank(payload.item_type))
    else {
        return Err(ApiError::bad_request("Please provide title, content, and type"));
    };
    let item_type = parse_item_type(&item_type)?;

    repo::get_study_item(&state.pool, user.get_id(), &item_id)?
        .ok_or(ApiError::NotFound(STUDY_ITEM_NOT_FOUND))?;

    let item = repo::update_study_item(&state.pool, &item_id, title, content, item_type, payload.tags)?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Edit, item_type.as_str(), item.get_id(), item.get_title())
            .in_collection(Some(item.get_collection_id())),
    );

    Ok(Json(ApiResponse::ok(item)))
}

/// Handler for `DELETE /api/study-items/{id}`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn delete_study_item_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<String>,
) -> Result<Reply<&'static str>, ApiError> {
    let item = repo::get_study_item(&state.pool, user.get_id(), &item_id)?
        .ok_or(ApiError::NotFound(STUDY_ITEM_NOT_FOUND))?;

    repo::delete_study_item(&state.pool, &item_id)?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::Delete,
            item.get_item_type().as_str(),
            item.get_id(),
            item.get_title(),
        )
        .in_collection(Some(item.get_collection_id())),
    );

    Ok(Json(ApiResponse::ok("Study item deleted successfully")))
}

/// Handler for `POST /api/study-items/{id}/audio`
///
/// Reads the item aloud (only the answer for flashcard and quiz items),
/// stores the MP3 and saves its URL on the item.
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn generate_study_item_audio_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<String>,
) -> Result<Reply<AudioUrlDto>, ApiError> {
    let item = repo::get_study_item(&state.pool, user.get_id(), &item_id)?
        .ok_or(ApiError::NotFound(STUDY_ITEM_NOT_FOUND))?;

    let text = speech_text(item.get_item_type(), item.get_content());
    let key = format!("audio_{}_{}.mp3", item.get_id(), timestamp_millis());
    let audio_url = synthesize_and_store(&state, text, &key).await?;

    repo::set_study_item_audio_url(&state.pool, item.get_id(), &audio_url)?;

    info!("Generated audio for study item {}", item.get_id());
    Ok(Json(ApiResponse::ok(AudioUrlDto { audio_url })))
}
