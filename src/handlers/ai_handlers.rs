use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Reply, log_activity, synthesize_and_store, timestamp_millis};
use crate::AppState;
use crate::auth::AuthUser;
use crate::dto::{
    AnswerDto, ApiResponse, AudioUrlDto, GenerateFlashcardsDto, GeneratedFlashcardsDto, SummarizeDto, SummaryDto,
    TextToSpeechDto, TutorDto, non_blank,
};
use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::models::{Activity, ActivityType};
use crate::repo::{self, NewFlashcard};
use crate::text::{
    FLASHCARD_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT, TUTOR_SYSTEM_PROMPT, parse_generated_cards, truncate_chars,
    tutor_prompt,
};
use crate::vendors::VendorError;

/// Title given to every set created from generated cards
pub const GENERATED_SET_TITLE: &str = "AI Generated Flashcards";

/// Longest activity title taken from free text
const ACTIVITY_TITLE_CHARS: usize = 50;

fn activity_title(text: &str) -> &str {
    truncate_chars(text.trim(), ACTIVITY_TITLE_CHARS)
}

/// Handler for generating flashcards from text
///
/// This function handles POST requests to `/api/ai/flashcards`. The model's
/// reply is parsed into cards, which are saved as a new set.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn generate_flashcards_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<GenerateFlashcardsDto>,
) -> Result<Reply<GeneratedFlashcardsDto>, ApiError> {
    let text = non_blank(payload.text).ok_or_else(|| ApiError::bad_request("Please provide text"))?;

    let collection_id = non_blank(payload.collection_id);
    if let Some(collection_id) = &collection_id {
        repo::get_collection(&state.pool, user.get_id(), collection_id)?
            .ok_or(ApiError::NotFound("Collection not found"))?;
    }

    let prompt = format!(
        "Create flashcards from the following text:\n\n{}",
        truncate_chars(&text, state.limits.max_input_chars)
    );
    let reply = state.text_generator.complete(FLASHCARD_SYSTEM_PROMPT, &prompt).await?;

    let cards: Vec<NewFlashcard> = parse_generated_cards(&reply)
        .into_iter()
        .map(|card| NewFlashcard { question: card.question, answer: card.answer, tags: Vec::new(), difficulty: None })
        .collect();
    if cards.is_empty() {
        warn!("Model reply held no usable flashcards");
        return Err(VendorError::EmptyResponse.into());
    }

    let set = repo::create_flashcard_set(
        &state.pool,
        user.get_id(),
        collection_id,
        GENERATED_SET_TITLE.to_string(),
        None,
        cards,
    )?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::AiGenerate,
            super::flashcard_handlers::FLASHCARD_SET_ITEM_TYPE,
            set.set.get_id(),
            set.set.get_title(),
        )
        .in_collection(set.set.get_collection_id()),
    );

    info!("Generated {} flashcards into set {}", set.cards.len(), set.set.get_id());
    Ok(Json(ApiResponse::ok(GeneratedFlashcardsDto { flashcards: set })))
}

/// Handler for `POST /api/ai/summarize`
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<SummarizeDto>,
) -> Result<Reply<SummaryDto>, ApiError> {
    let text = non_blank(payload.text).ok_or_else(|| ApiError::bad_request("Please provide text"))?;

    let summary = state
        .text_generator
        .complete(SUMMARY_SYSTEM_PROMPT, truncate_chars(&text, state.limits.max_input_chars))
        .await?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::AiGenerate,
            "summary",
            &Uuid::new_v4().to_string(),
            activity_title(&text),
        ),
    );

    Ok(Json(ApiResponse::ok(SummaryDto { summary })))
}

/// Handler for `POST /api/ai/tutor`
///
/// Optional `context` is passed to the model as study material.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn tutor_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<TutorDto>,
) -> Result<Reply<AnswerDto>, ApiError> {
    let question = non_blank(payload.question).ok_or_else(|| ApiError::bad_request("Please provide a question"))?;

    let context = payload
        .context
        .as_deref()
        .map(|c| truncate_chars(c, state.limits.max_input_chars));
    let prompt = tutor_prompt(truncate_chars(&question, state.limits.max_input_chars), context);
    let answer = state.text_generator.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

    log_activity(
        &state.pool,
        Activity::new(
            user.get_id(),
            ActivityType::AiGenerate,
            "tutor",
            &Uuid::new_v4().to_string(),
            activity_title(&question),
        ),
    );

    Ok(Json(ApiResponse::ok(AnswerDto { answer })))
}

/// Handler for `POST /api/ai/text-to-speech`
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn text_to_speech_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<TextToSpeechDto>,
) -> Result<Reply<AudioUrlDto>, ApiError> {
    let text = non_blank(payload.text).ok_or_else(|| ApiError::bad_request("Please provide text"))?;

    let key = format!("tts_{}_{}.mp3", user.get_id(), timestamp_millis());
    let audio_url = synthesize_and_store(&state, &text, &key).await?;

    log_activity(
        &state.pool,
        Activity::new(user.get_id(), ActivityType::AiGenerate, "audio", &key, activity_title(&text)),
    );

    Ok(Json(ApiResponse::ok(AudioUrlDto { audio_url })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    const CARDS_REPLY: &str = "Here you go:\n```json\n[{\"question\": \"What is ATP?\", \"answer\": \"Energy currency\"}, {\"question\": \"\", \"answer\": \"dropped\"}]\n```";

    #[tokio::test]
    async fn test_generate_flashcards_saves_set() {
        let generator = Arc::new(FakeTextGenerator::replying(CARDS_REPLY));
        let state = test_state_with(generator.clone(), Arc::new(FakeSpeech::default()), Arc::new(MemoryStore::default()));
        let (user, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state.clone());

        let response = app
            .oneshot(request(
                "POST",
                "/api/ai/flashcards",
                Some(&token),
                Some(json!({"text": "Mitochondria make ATP."})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["flashcards"]["title"], GENERATED_SET_TITLE);
        let cards = body["data"]["flashcards"]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["answer"], "Energy currency");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, FLASHCARD_SYSTEM_PROMPT);
        assert!(prompts[0].1.ends_with("Mitochondria make ATP."));

        let sets = repo::list_flashcard_sets(&state.pool, user.get_id()).unwrap();
        assert_eq!(sets.len(), 1);
        let activities = repo::list_recent_activities(&state.pool, user.get_id(), 5).unwrap();
        assert_eq!(activities[0].get_activity_type(), ActivityType::AiGenerate);
    }

    #[tokio::test]
    async fn test_generate_flashcards_without_usable_cards() {
        let state = test_state_with(
            Arc::new(FakeTextGenerator::replying("Sorry, I cannot help with that.")),
            Arc::new(FakeSpeech::default()),
            Arc::new(MemoryStore::default()),
        );
        let (user, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state.clone());

        let response = app
            .oneshot(request("POST", "/api/ai/flashcards", Some(&token), Some(json!({"text": "notes"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Server error");
        assert!(repo::list_flashcard_sets(&state.pool, user.get_id()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_flashcards_foreign_collection() {
        let state = test_state();
        let (other, _) = signed_in_user(&state, "b@example.com");
        let collection = repo::create_collection(&state.pool, other.get_id(), "Theirs".to_string(), None, None, None).unwrap();
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .oneshot(request(
                "POST",
                "/api/ai/flashcards",
                Some(&token),
                Some(json!({"text": "notes", "collection_id": collection.get_id()})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summarize_and_tutor() {
        let generator = Arc::new(FakeTextGenerator::replying("Short version."));
        let state = test_state_with(generator.clone(), Arc::new(FakeSpeech::default()), Arc::new(MemoryStore::default()));
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/ai/summarize", Some(&token), Some(json!({"text": "Long text"}))))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"]["summary"], "Short version.");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/ai/tutor",
                Some(&token),
                Some(json!({"question": "Why?", "context": "Because."})),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"]["answer"], "Short version.");
        assert_eq!(generator.prompts.lock().unwrap()[1].1, tutor_prompt("Why?", Some("Because.")));

        let response = app
            .oneshot(request("POST", "/api/ai/summarize", Some(&token), Some(json!({"text": "  "}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Please provide text");
    }

    #[tokio::test]
    async fn test_vendor_failure_is_server_error() {
        let state = test_state_with(
            Arc::new(FakeTextGenerator::failing()),
            Arc::new(FakeSpeech::default()),
            Arc::new(MemoryStore::default()),
        );
        let (_, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .oneshot(request("POST", "/api/ai/tutor", Some(&token), Some(json!({"question": "Why?"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Server error");
    }

    #[tokio::test]
    async fn test_text_to_speech_stores_audio() {
        let store = Arc::new(MemoryStore::default());
        let state = test_state_with(Arc::new(FakeTextGenerator::replying("ok")), Arc::new(FakeSpeech::default()), store.clone());
        let (user, token) = signed_in_user(&state, "a@example.com");
        let app = create_app(state);

        let response = app
            .oneshot(request("POST", "/api/ai/text-to-speech", Some(&token), Some(json!({"text": "Hello there"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let url = body_json(response).await["data"]["audio_url"].as_str().unwrap().to_string();
        let prefix = format!("{TEST_MEDIA_URL}/tts_{}_", user.get_id());
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".mp3"));

        let objects = store.objects.lock().unwrap();
        let (bytes, content_type) = objects.values().next().unwrap();
        assert_eq!(bytes.as_slice(), b"ID3fake-mp3");
        assert_eq!(content_type, "audio/mpeg");
    }
}
