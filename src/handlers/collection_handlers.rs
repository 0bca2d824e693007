use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{Created, Reply, created, log_activity};
use crate::AppState;
use crate::auth::AuthUser;
use crate::dto::{ApiResponse, CollectionDto, non_blank};
use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::models::{Activity, ActivityType, CollectionWithCount, FlashcardSetWithCards, StudyItem};
use crate::repo;

const COLLECTION_NOT_FOUND: &str = "Collection not found";

/// Handler for listing the caller's collections
///
/// This function handles GET requests to `/api/collections`.
///
/// ### Returns
///
/// The collections, newest first, each with its study item count
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn list_collections_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Reply<Vec<CollectionWithCount>>, ApiError> {
    let collections = repo::list_collections(&state.pool, user.get_id())?;
    debug!("Retrieved {} collections", collections.len());
    Ok(Json(ApiResponse::ok(collections)))
}

/// Handler for `GET /api/collections/{id}`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn get_collection_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
) -> Result<Reply<CollectionWithCount>, ApiError> {
    let collection = repo::get_collection_with_count(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok(collection)))
}

/// Handler for creating a collection
///
/// This function handles POST requests to `/api/collections`.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn create_collection_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CollectionDto>,
) -> Result<Created<CollectionWithCount>, ApiError> {
    let title = non_blank(payload.title).ok_or_else(|| ApiError::bad_request("Please provide a title"))?;

    let collection = repo::create_collection(
        &state.pool,
        user.get_id(),
        title,
        payload.description,
        payload.color,
        payload.icon,
    )?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Create, "collection", collection.get_id(), collection.get_title())
            .in_collection(Some(collection.get_id())),
    );

    info!("Created collection {}", collection.get_id());
    Ok(created(CollectionWithCount { collection, item_count: 0 }))
}

/// Handler for `PUT /api/collections/{id}`
///
/// Optional fields that are left out keep their current values.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn update_collection_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
    JsonBody(payload): JsonBody<CollectionDto>,
) -> Result<Reply<CollectionWithCount>, ApiError> {
    let title = non_blank(payload.title).ok_or_else(|| ApiError::bad_request("Please provide a title"))?;

    repo::get_collection(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;

    repo::update_collection(
        &state.pool,
        &collection_id,
        Some(title),
        payload.description,
        payload.color,
        payload.icon,
    )?;

    let updated = repo::get_collection_with_count(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::Edit,
            "collection",
            &collection_id,
            updated.collection.get_title(),
        )
        .in_collection(Some(&collection_id)),
    );

    Ok(Json(ApiResponse::ok(updated)))
}

/// Handler for `DELETE /api/collections/{id}`
///
/// The collection's study items are deleted with it.
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn delete_collection_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
) -> Result<Reply<&'static str>, ApiError> {
    let collection = repo::get_collection(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;

    repo::delete_collection(&state.pool, &collection_id)?;

    // No collection_id: the row it would point at is gone
    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Delete, "collection", &collection_id, collection.get_title()),
    );

    info!("Deleted collection {}", collection_id);
    Ok(Json(ApiResponse::ok("Collection deleted successfully")))
}

/// Handler for `GET /api/collections/{id}/items`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn list_collection_items_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
) -> Result<Reply<Vec<StudyItem>>, ApiError> {
    repo::get_collection(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;

    let items = repo::list_study_items_for_collection(&state.pool, &collection_id)?;
    Ok(Json(ApiResponse::ok(items)))
}

/// Handler for `GET /api/collections/{id}/flashcards`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn list_collection_flashcards_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
) -> Result<Reply<Vec<FlashcardSetWithCards>>, ApiError> {
    repo::get_collection(&state.pool, user.get_id(), &collection_id)?
        .ok_or(ApiError::NotFound(COLLECTION_NOT_FOUND))?;

    let sets = repo::list_flashcard_sets_for_collection(&state.pool, &collection_id)?;
    Ok(Json(ApiResponse::ok(sets)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use crate::models::StudyItemType;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_create_and_list_collections() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state.clone());

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/collections",
                Some(&token),
                Some(json!({"title": "Biology", "color": "#22c55e", "icon": "leaf"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Biology");
        assert_eq!(body["data"]["item_count"], 0);

        let response = app.oneshot(request("GET", "/api/collections", Some(&token), None)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let activities = repo::list_recent_activities(&state.pool, user.get_id(), 10).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].get_activity_type(), ActivityType::Create);
        assert_eq!(activities[0].get_item_type(), "collection");
    }

    #[tokio::test]
    async fn test_create_collection_requires_title() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .oneshot(request("POST", "/api/collections", Some(&token), Some(json!({"description": "x"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Please provide a title");
    }

    #[tokio::test]
    async fn test_malformed_body_gets_error_envelope() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let raw = axum::http::Request::builder()
            .method("POST")
            .uri("/api/collections")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(raw).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("JSON"));

        let response = app
            .oneshot(request("POST", "/api/collections", Some(&token), Some(json!({"title": 5}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("invalid type"));
    }

    #[tokio::test]
    async fn test_missing_content_type_gets_error_envelope() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let raw = axum::http::Request::builder()
            .method("POST")
            .uri("/api/collections")
            .header("Authorization", format!("Bearer {token}"))
            .body(axum::body::Body::from(r#"{"title": "Biology"}"#))
            .unwrap();
        let response = app.oneshot(raw).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_other_users_collection_is_not_found() {
        let state = test_state();
        let (owner, _) = signed_in_user(&state, "owner@example.com");
        let (_, intruder_token) = signed_in_user(&state, "intruder@example.com");
        let collection =
            repo::create_collection(&state.pool, owner.get_id(), "Private".to_string(), None, None, None).unwrap();
        let app = create_app(state);
        let uri = format!("/api/collections/{}", collection.get_id());

        for (method, body) in [("GET", None), ("PUT", Some(json!({"title": "Mine"}))), ("DELETE", None)] {
            let response = app
                .clone()
                .oneshot(request(method, &uri, Some(&intruder_token), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
            assert_eq!(body_json(response).await["error"], "Collection not found");
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_collection() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let collection =
            repo::create_collection(&state.pool, user.get_id(), "Old".to_string(), None, None, None).unwrap();
        let app = create_app(state.clone());
        let uri = format!("/api/collections/{}", collection.get_id());

        let response = app
            .clone()
            .oneshot(request("PUT", &uri, Some(&token), Some(json!({"title": "New", "description": "Fresh"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "New");
        assert_eq!(body["data"]["description"], "Fresh");

        let response = app.clone().oneshot(request("DELETE", &uri, Some(&token), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], "Collection deleted successfully");

        let response = app.oneshot(request("GET", &uri, Some(&token), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_collection_items_and_flashcards() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let collection =
            repo::create_collection(&state.pool, user.get_id(), "Chem".to_string(), None, None, None).unwrap();
        repo::create_study_item(
            &state.pool,
            StudyItem::new(
                user.get_id(),
                collection.get_id(),
                StudyItemType::Note,
                "Bonds".to_string(),
                "Covalent and ionic".to_string(),
                vec![],
            ),
        )
        .unwrap();
        repo::create_flashcard_set(
            &state.pool,
            user.get_id(),
            Some(collection.get_id().to_string()),
            "Elements".to_string(),
            None,
            vec![repo::NewFlashcard {
                question: "Symbol for gold?".to_string(),
                answer: "Au".to_string(),
                tags: vec![],
                difficulty: None,
            }],
        )
        .unwrap();
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/collections/{}/items", collection.get_id()), Some(&token), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["title"], "Bonds");
        assert_eq!(body["data"][0]["type"], "note");

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/collections/{}", collection.get_id()), Some(&token), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"]["item_count"], 1);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/collections/{}/flashcards", collection.get_id()),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["title"], "Elements");
        assert_eq!(body["data"][0]["cards"][0]["answer"], "Au");
    }
}
