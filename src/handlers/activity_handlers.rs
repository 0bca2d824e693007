use axum::{
    Json,
    extract::State,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::flashcard_handlers::FLASHCARD_SET_ITEM_TYPE;
use super::{Created, Reply, created};
use crate::AppState;
use crate::auth::AuthUser;
use crate::dto::{ActivityQueryDto, ApiResponse, RecordStudyDto, non_blank};
use crate::errors::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::models::{Activity, ActivityType};
use crate::repo;

/// Handler for listing the caller's recent activity
///
/// This function handles GET requests to `/api/activity`, newest first.
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn list_activity_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    QueryParams(query): QueryParams<ActivityQueryDto>,
) -> Result<Reply<Vec<Activity>>, ApiError> {
    let activities = repo::list_recent_activities(&state.pool, user.get_id(), query.effective_limit())?;
    Ok(Json(ApiResponse::ok(activities)))
}

/// Handler for `POST /api/activity/study`
///
/// Records a study session. When the item is a study item or flashcard set
/// the caller owns, its study counter is bumped as well; the session is
/// logged either way.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn record_study_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<RecordStudyDto>,
) -> Result<Created<Activity>, ApiError> {
    let (Some(item_type), Some(item_id), Some(item_title)) = (
        non_blank(payload.item_type),
        non_blank(payload.item_id),
        non_blank(payload.item_title),
    ) else {
        return Err(ApiError::bad_request("Please provide item_type, item_id, and item_title"));
    };
    if payload.duration.is_some_and(|d| d < 0) {
        return Err(ApiError::bad_request("Duration must not be negative"));
    }

    let counted = if item_type == FLASHCARD_SET_ITEM_TYPE {
        repo::record_flashcard_set_session(&state.pool, user.get_id(), &item_id)?
    } else {
        repo::record_study_item_session(&state.pool, user.get_id(), &item_id)?
    };
    debug!(counted, "Study session for {} {}", item_type, item_id);

    let collection_id = non_blank(payload.collection_id);
    let activity = repo::record_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Study, item_type, &item_id, &item_title)
            .in_collection(collection_id.as_deref())
            .with_duration(payload.duration),
    )?;

    Ok(created(activity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use crate::models::{StudyItem, StudyItemType};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_non_numeric_limit_gets_error_envelope() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app.oneshot(request("GET", "/api/activity?limit=abc", Some(&token), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("query string"));
    }

    #[tokio::test]
    async fn test_record_study_bumps_study_item() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let collection = repo::create_collection(&state.pool, user.get_id(), "Bio".to_string(), None, None, None).unwrap();
        let item = repo::create_study_item(
            &state.pool,
            StudyItem::new(
                user.get_id(),
                collection.get_id(),
                StudyItemType::Note,
                "Cells".to_string(),
                "Cells are small".to_string(),
                vec![],
            ),
        )
        .unwrap();
        let app = create_app(state.clone());

        let response = app
            .oneshot(request(
                "POST",
                "/api/activity/study",
                Some(&token),
                Some(json!({
                    "item_type": "note",
                    "item_id": item.get_id(),
                    "item_title": "Cells",
                    "collection_id": collection.get_id(),
                    "duration": 90000
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["activity_type"], "study");
        assert_eq!(body["data"]["duration"], 90000);

        let item = repo::get_study_item(&state.pool, user.get_id(), item.get_id()).unwrap().unwrap();
        assert_eq!(item.get_study_count(), 1);
        assert!(item.get_last_studied().is_some());
    }

    #[tokio::test]
    async fn test_record_study_bumps_flashcard_set() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let set = repo::create_flashcard_set(&state.pool, user.get_id(), None, "Set".to_string(), None, vec![]).unwrap();
        let app = create_app(state.clone());

        let response = app
            .oneshot(request(
                "POST",
                "/api/activity/study",
                Some(&token),
                Some(json!({"item_type": "flashcard_set", "item_id": set.set.get_id(), "item_title": "Set"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let set = repo::get_flashcard_set(&state.pool, user.get_id(), set.set.get_id()).unwrap().unwrap();
        assert_eq!(set.get_study_count(), 1);
    }

    #[tokio::test]
    async fn test_record_study_validation() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/activity/study", Some(&token), Some(json!({"item_type": "note"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                "POST",
                "/api/activity/study",
                Some(&token),
                Some(json!({"item_type": "note", "item_id": "x", "item_title": "X", "duration": -5})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_activity_limit_and_scope() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let (other, _) = signed_in_user(&state, "b@example.com");
        for i in 0..3 {
            repo::record_activity(
                &state.pool,
                Activity::new(user.get_id(), ActivityType::Create, "collection", &format!("c{i}"), "Title"),
            )
            .unwrap();
        }
        repo::record_activity(&state.pool, Activity::new(other.get_id(), ActivityType::Create, "collection", "x", "Theirs"))
            .unwrap();
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/activity", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/activity?limit=2", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

        let response = app
            .oneshot(request("GET", "/api/activity?limit=0", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_activity_requires_token() {
        let app = create_app(test_state());
        let response = app.oneshot(request("GET", "/api/activity", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Access denied. No token provided.");
    }
}
