use enzolearn::dto::{
    AnswerDto, ApiResponse, AudioUrlDto, AuthPayload, CollectionDto, CreateStudyItemDto, GenerateFlashcardsDto,
    GeneratedFlashcardsDto, LoginDto, RegisterDto, SummarizeDto, SummaryDto, TutorDto,
};
use enzolearn::models::{Activity, CollectionWithCount, FlashcardSetWithCards, StudyItem, User};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Error type for CLI client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Server answered with an error envelope
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Network/connection/request error
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The command needs a saved token
    #[error("Not logged in. Run `enzolearn-cli auth login` first")]
    NotLoggedIn,

    #[error("Could not access the token file: {0}")]
    TokenFile(#[from] std::io::Error),
}

/// Sends a request and unwraps the `{ success, data, error }` envelope
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.json::<ApiResponse<T>>().await;

    match body {
        Ok(ApiResponse { success: true, data: Some(data), .. }) => Ok(data),
        Ok(ApiResponse { error, .. }) => Err(ClientError::Server {
            status: status.as_u16(),
            message: error.unwrap_or_else(|| "Unknown error".to_string()),
        }),
        Err(e) if status.is_success() => Err(ClientError::Request(e)),
        Err(_) => Err(ClientError::Server { status: status.as_u16(), message: format!("HTTP {status}") }),
    }
}

/// HTTP client wrapper for communicating with the EnzoLearn server
pub struct EnzoLearnClient {
    /// The base URL of the server (e.g. "http://localhost:5000")
    base_url: String,
    client: Client,
    /// Where the bearer token is kept between runs
    token_path: Option<PathBuf>,
    token: Option<String>,
}

impl EnzoLearnClient {
    /// Creates a client, loading a previously saved token if there is one
    pub fn new(base_url: String, token_path: Option<PathBuf>) -> Self {
        let token = token_path
            .as_ref()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { base_url: base_url.trim_end_matches('/').to_string(), client: Client::new(), token_path, token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Attaches the saved bearer token
    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    fn save_token(&mut self, token: &str) -> Result<(), ClientError> {
        if let Some(path) = &self.token_path {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, token)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
            }
        }
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&mut self) -> Result<(), ClientError> {
        if let Some(path) = &self.token_path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        self.token = None;
        Ok(())
    }

    // ── Auth endpoints ───────────────────────────────────────────────

    /// Registers an account and keeps its token
    pub async fn register(&mut self, name: String, email: String, password: String) -> Result<AuthPayload, ClientError> {
        let dto = RegisterDto { name: Some(name), email: Some(email), password: Some(password) };
        let payload: AuthPayload = send(self.client.post(self.url("/auth/register")).json(&dto)).await?;
        self.save_token(&payload.token)?;
        Ok(payload)
    }

    /// Logs in and keeps the token
    pub async fn login(&mut self, email: String, password: String) -> Result<AuthPayload, ClientError> {
        let dto = LoginDto { email: Some(email), password: Some(password) };
        let payload: AuthPayload = send(self.client.post(self.url("/auth/login")).json(&dto)).await?;
        self.save_token(&payload.token)?;
        Ok(payload)
    }

    /// Tells the server and forgets the local token
    pub async fn logout(&mut self) -> Result<String, ClientError> {
        let message = send(self.authed(self.client.post(self.url("/auth/logout")))?).await?;
        self.clear_token()?;
        Ok(message)
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        send(self.authed(self.client.get(self.url("/auth/user")))?).await
    }

    // ── Collection endpoints ─────────────────────────────────────────

    pub async fn list_collections(&self) -> Result<Vec<CollectionWithCount>, ClientError> {
        send(self.authed(self.client.get(self.url("/collections")))?).await
    }

    pub async fn get_collection(&self, id: &str) -> Result<CollectionWithCount, ClientError> {
        send(self.authed(self.client.get(self.url(&format!("/collections/{id}"))))?).await
    }

    pub async fn create_collection(&self, dto: &CollectionDto) -> Result<CollectionWithCount, ClientError> {
        send(self.authed(self.client.post(self.url("/collections")).json(dto))?).await
    }

    pub async fn delete_collection(&self, id: &str) -> Result<String, ClientError> {
        send(self.authed(self.client.delete(self.url(&format!("/collections/{id}"))))?).await
    }

    pub async fn list_collection_items(&self, id: &str) -> Result<Vec<StudyItem>, ClientError> {
        send(self.authed(self.client.get(self.url(&format!("/collections/{id}/items"))))?).await
    }

    // ── Study item endpoints ─────────────────────────────────────────

    pub async fn get_study_item(&self, id: &str) -> Result<StudyItem, ClientError> {
        send(self.authed(self.client.get(self.url(&format!("/study-items/{id}"))))?).await
    }

    pub async fn create_study_item(&self, dto: &CreateStudyItemDto) -> Result<StudyItem, ClientError> {
        send(self.authed(self.client.post(self.url("/study-items")).json(dto))?).await
    }

    pub async fn delete_study_item(&self, id: &str) -> Result<String, ClientError> {
        send(self.authed(self.client.delete(self.url(&format!("/study-items/{id}"))))?).await
    }

    /// Has the server read the item aloud
    pub async fn generate_audio(&self, id: &str) -> Result<AudioUrlDto, ClientError> {
        send(self.authed(self.client.post(self.url(&format!("/study-items/{id}/audio"))))?).await
    }

    // ── Flashcard endpoints ──────────────────────────────────────────

    pub async fn list_flashcard_sets(&self) -> Result<Vec<FlashcardSetWithCards>, ClientError> {
        send(self.authed(self.client.get(self.url("/flashcards")))?).await
    }

    pub async fn get_flashcard_set(&self, id: &str) -> Result<FlashcardSetWithCards, ClientError> {
        send(self.authed(self.client.get(self.url(&format!("/flashcards/{id}"))))?).await
    }

    pub async fn delete_flashcard_set(&self, id: &str) -> Result<String, ClientError> {
        send(self.authed(self.client.delete(self.url(&format!("/flashcards/{id}"))))?).await
    }

    // ── AI endpoints ─────────────────────────────────────────────────

    pub async fn generate_flashcards(
        &self,
        text: String,
        collection_id: Option<String>,
    ) -> Result<GeneratedFlashcardsDto, ClientError> {
        let dto = GenerateFlashcardsDto { text: Some(text), collection_id };
        send(self.authed(self.client.post(self.url("/ai/flashcards")).json(&dto))?).await
    }

    pub async fn summarize(&self, text: String) -> Result<SummaryDto, ClientError> {
        let dto = SummarizeDto { text: Some(text) };
        send(self.authed(self.client.post(self.url("/ai/summarize")).json(&dto))?).await
    }

    pub async fn tutor(&self, question: String, context: Option<String>) -> Result<AnswerDto, ClientError> {
        let dto = TutorDto { question: Some(question), context };
        send(self.authed(self.client.post(self.url("/ai/tutor")).json(&dto))?).await
    }

    // ── Activity endpoints ───────────────────────────────────────────

    pub async fn list_activity(&self, limit: Option<i64>) -> Result<Vec<Activity>, ClientError> {
        let mut request = self.client.get(self.url("/activity"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        send(self.authed(request)?).await
    }
}
