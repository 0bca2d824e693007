use serde::{Deserialize, Serialize};

use crate::models::{FlashcardSetWithCards, User};

/// The envelope every API response is wrapped in
///
/// Successful responses carry `data`, failed ones carry `error`; the other
/// field is omitted from the JSON entirely.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

/// Returns the value if it holds something other than whitespace
///
/// Request fields are all optional at the deserialization layer so that
/// missing input can be answered with a 400 and a readable message.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegisterDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginDto {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `PUT /api/auth/user`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub preferences: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ForgotPasswordDto {
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ResetPasswordDto {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued session token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Body of the collection create and update endpoints
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CollectionDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Body of `POST /api/study-items`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateStudyItemDto {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub collection_id: Option<String>,
}

/// Body of `PUT /api/study-items/{id}`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateStudyItemDto {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// One card as submitted by a client
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct FlashcardInputDto {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<String>,
}

/// Body of `POST /api/flashcards`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateFlashcardSetDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub collection_id: Option<String>,
    pub cards: Option<Vec<FlashcardInputDto>>,
}

/// Body of `PUT /api/flashcards/{id}`
///
/// A present `cards` list replaces every card in the set.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateFlashcardSetDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cards: Option<Vec<FlashcardInputDto>>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct GenerateFlashcardsDto {
    pub text: Option<String>,
    pub collection_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SummarizeDto {
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TutorDto {
    pub question: Option<String>,
    pub context: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TextToSpeechDto {
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedFlashcardsDto {
    pub flashcards: FlashcardSetWithCards,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryDto {
    pub summary: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnswerDto {
    pub answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AudioUrlDto {
    pub audio_url: String,
}

/// Query string of `GET /api/activity`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ActivityQueryDto {
    pub limit: Option<i64>,
}

impl ActivityQueryDto {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// The requested limit, defaulted and clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }
}

/// Body of `POST /api/activity/study`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RecordStudyDto {
    pub item_type: Option<String>,
    pub item_id: Option<String>,
    pub item_title: Option<String>,
    pub collection_id: Option<String>,
    /// Session length in milliseconds
    pub duration: Option<i64>,
}
