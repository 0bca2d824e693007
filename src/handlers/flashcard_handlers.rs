use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{Created, Reply, created, log_activity};
use crate::AppState;
use crate::auth::AuthUser;
use crate::dto::{ApiResponse, CreateFlashcardSetDto, FlashcardInputDto, UpdateFlashcardSetDto, non_blank};
use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::models::{Activity, ActivityType, Difficulty, FlashcardSetWithCards};
use crate::repo::{self, NewFlashcard};

const FLASHCARD_SET_NOT_FOUND: &str = "Flashcard set not found";

/// Activity item type for whole sets
pub(crate) const FLASHCARD_SET_ITEM_TYPE: &str = "flashcard_set";

/// Validates submitted cards, keeping their order
fn cards_from_input(cards: Vec<FlashcardInputDto>) -> Result<Vec<NewFlashcard>, ApiError> {
    cards
        .into_iter()
        .map(|card| {
            let (Some(question), Some(answer)) = (non_blank(card.question), non_blank(card.answer)) else {
                return Err(ApiError::bad_request("Each card needs a question and an answer"));
            };
            let difficulty = non_blank(card.difficulty)
                .map(|d| {
                    d.parse::<Difficulty>()
                        .map_err(|_| ApiError::bad_request(format!("Invalid difficulty: {d}. Expected easy, medium, or hard")))
                })
                .transpose()?;
            Ok(NewFlashcard { question, answer, tags: card.tags.unwrap_or_default(), difficulty })
        })
        .collect()
}

/// Handler for listing the caller's flashcard sets with their cards
///
/// This function handles GET requests to `/api/flashcards`.
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn list_flashcard_sets_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Reply<Vec<FlashcardSetWithCards>>, ApiError> {
    let sets = repo::list_flashcard_sets(&state.pool, user.get_id())?;
    debug!("Retrieved {} flashcard sets", sets.len());
    Ok(Json(ApiResponse::ok(sets)))
}

/// Handler for `GET /api/flashcards/{id}`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn get_flashcard_set_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(set_id): Path<String>,
) -> Result<Reply<FlashcardSetWithCards>, ApiError> {
    let set = repo::get_flashcard_set_with_cards(&state.pool, user.get_id(), &set_id)?
        .ok_or(ApiError::NotFound(FLASHCARD_SET_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok(set)))
}

/// Handler for creating a flashcard set
///
/// This function handles POST requests to `/api/flashcards`. The set and
/// its cards are written together or not at all.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn create_flashcard_set_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateFlashcardSetDto>,
) -> Result<Created<FlashcardSetWithCards>, ApiError> {
    let (Some(title), Some(cards)) = (non_blank(payload.title), payload.cards.filter(|c| !c.is_empty())) else {
        return Err(ApiError::bad_request("Please provide title and cards array"));
    };
    let cards = cards_from_input(cards)?;

    let collection_id = non_blank(payload.collection_id);
    if let Some(collection_id) = &collection_id {
        repo::get_collection(&state.pool, user.get_id(), collection_id)?
            .ok_or(ApiError::NotFound("Collection not found"))?;
    }

    let set = repo::create_flashcard_set(
        &state.pool,
        user.get_id(),
        collection_id,
        title,
        payload.description,
        cards,
    )?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::Create,
            FLASHCARD_SET_ITEM_TYPE,
            set.set.get_id(),
            set.set.get_title(),
        )
        .in_collection(set.set.get_collection_id()),
    );

    info!("Created flashcard set {} with {} cards", set.set.get_id(), set.cards.len());
    Ok(created(set))
}

/// Handler for `PUT /api/flashcards/{id}`
///
/// A `cards` array replaces every card in the set; without one the cards
/// stay as they are.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn update_flashcard_set_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(set_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateFlashcardSetDto>,
) -> Result<Reply<FlashcardSetWithCards>, ApiError> {
    let title = non_blank(payload.title).ok_or_else(|| ApiError::bad_request("Please provide title"))?;
    let cards = payload.cards.map(cards_from_input).transpose()?;

    repo::get_flashcard_set(&state.pool, user.get_id(), &set_id)?
        .ok_or(ApiError::NotFound(FLASHCARD_SET_NOT_FOUND))?;

    let set = repo::update_flashcard_set(&state.pool, &set_id, title, payload.description, cards)?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Edit, FLASHCARD_SET_ITEM_TYPE, &set_id, set.set.get_title())
            .in_collection(set.set.get_collection_id()),
    );

    Ok(Json(ApiResponse::ok(set)))
}

/// Handler for `DELETE /api/flashcards/{id}`
#[instrument(skip(state, user), fields(user_id = %user.get_id()))]
pub async fn delete_flashcard_set_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(set_id): Path<String>,
) -> Result<Reply<&'static str>, ApiError> {
    let set = repo::get_flashcard_set(&state.pool, user.get_id(), &set_id)?
        .ok_or(ApiError::NotFound(FLASHCARD_SET_NOT_FOUND))?;

    repo::delete_flashcard_set(&state.pool, &set_id)?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::Delete, FLASHCARD_SET_ITEM_TYPE, &set_id, set.get_title())
            .in_collection(set.get_collection_id()),
    );

    Ok(Json(ApiResponse::ok("Flashcard set deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_cards_from_input() {
        let cards = cards_from_input(vec![FlashcardInputDto {
            question: Some("Q".to_string()),
            answer: Some("A".to_string()),
            tags: None,
            difficulty: Some("hard".to_string()),
        }])
        .unwrap();
        assert_eq!(cards[0].difficulty, Some(Difficulty::Hard));
        assert!(cards[0].tags.is_empty());

        let missing_answer = FlashcardInputDto { question: Some("Q".to_string()), ..Default::default() };
        assert!(cards_from_input(vec![missing_answer]).is_err());

        let bad_difficulty = FlashcardInputDto {
            question: Some("Q".to_string()),
            answer: Some("A".to_string()),
            difficulty: Some("brutal".to_string()),
            ..Default::default()
        };
        assert!(cards_from_input(vec![bad_difficulty]).is_err());
    }

    #[tokio::test]
    async fn test_create_and_get_flashcard_set() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state.clone());

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/flashcards",
                Some(&token),
                Some(json!({
                    "title": "Capitals",
                    "description": "European capitals",
                    "cards": [
                        {"question": "France?", "answer": "Paris", "difficulty": "easy"},
                        {"question": "Austria?", "answer": "Vienna", "tags": ["central"]}
                    ]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let set_id = body["data"]["id"].as_str().unwrap().to_string();
        assert!(body["data"]["collection_id"].is_null());
        assert_eq!(body["data"]["cards"].as_array().unwrap().len(), 2);

        let response = app
            .oneshot(request("GET", &format!("/api/flashcards/{set_id}"), Some(&token), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["cards"][0]["question"], "France?");
        assert_eq!(body["data"]["cards"][1]["tags"], json!(["central"]));

        let activities = repo::list_recent_activities(&state.pool, user.get_id(), 10).unwrap();
        assert_eq!(activities[0].get_item_type(), "flashcard_set");
    }

    #[tokio::test]
    async fn test_create_flashcard_set_validation() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        for body in [json!({"title": "No cards"}), json!({"title": "Empty", "cards": []}), json!({"cards": [{"question": "q", "answer": "a"}]})] {
            let response = app
                .clone()
                .oneshot(request("POST", "/api/flashcards", Some(&token), Some(body)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "Please provide title and cards array");
        }

        let response = app
            .oneshot(request(
                "POST",
                "/api/flashcards",
                Some(&token),
                Some(json!({"title": "T", "collection_id": "nope", "cards": [{"question": "q", "answer": "a"}]})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Collection not found");
    }

    #[tokio::test]
    async fn test_update_replaces_cards_only_when_given() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let set = repo::create_flashcard_set(
            &state.pool,
            user.get_id(),
            None,
            "Old".to_string(),
            None,
            vec![NewFlashcard { question: "q1".to_string(), answer: "a1".to_string(), tags: vec![], difficulty: None }],
        )
        .unwrap();
        let app = create_app(state);
        let uri = format!("/api/flashcards/{}", set.set.get_id());

        let response = app
            .clone()
            .oneshot(request("PUT", &uri, Some(&token), Some(json!({"title": "Renamed"}))))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Renamed");
        assert_eq!(body["data"]["cards"][0]["question"], "q1");

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &uri,
                Some(&token),
                Some(json!({"title": "Renamed", "cards": [{"question": "q2", "answer": "a2"}, {"question": "q3", "answer": "a3"}]})),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let questions: Vec<&str> = body["data"]["cards"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["question"].as_str().unwrap())
            .collect();
        assert_eq!(questions, vec!["q2", "q3"]);

        let response = app
            .oneshot(request("PUT", &uri, Some(&token), Some(json!({"description": "no title"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Please provide title");
    }

    #[tokio::test]
    async fn test_delete_flashcard_set() {
        let state = test_state();
        let (user, token) = signed_in_user(&state, "a@example.com");
        let (_, other_token) = signed_in_user(&state, "b@example.com");
        let set = repo::create_flashcard_set(&state.pool, user.get_id(), None, "Gone".to_string(), None, vec![]).unwrap();
        let app = create_app(state);
        let uri = format!("/api/flashcards/{}", set.set.get_id());

        let response = app.clone().oneshot(request("DELETE", &uri, Some(&other_token), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Flashcard set not found");

        let response = app.clone().oneshot(request("DELETE", &uri, Some(&token), None)).await.unwrap();
        assert_eq!(body_json(response).await["data"], "Flashcard set deleted successfully");

        let response = app.oneshot(request("GET", "/api/flashcards", Some(&token), None)).await.unwrap();
        assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
    }
}
