use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::{PasswordError, TokenError};
use crate::dto::ApiResponse;
use crate::vendors::VendorError;

/// The message every unexpected failure is reported with
pub const SERVER_ERROR_MESSAGE: &str = "Server error";
pub const UPLOAD_ERROR_MESSAGE: &str = "Error uploading audio file";
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    /// The client is over its request budget; holds the seconds until it may retry
    #[error("Rate limited for {0}s")]
    TooManyRequests(u64),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "Rejected request body");
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(status = %rejection.status(), "Rejected query string");
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
            }
            ApiError::Vendor(err) if err.is_storage() => {
                error!(error = %err, "Storing object failed");
                (StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_ERROR_MESSAGE.to_string())
            }
            ApiError::Vendor(err) => {
                error!(error = %err, "Vendor call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
            }
            err @ (ApiError::Token(_) | ApiError::Password(_)) => {
                error!(error = %err, "Credential handling failed");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::TooManyRequests(retry_after) => {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after.to_string())],
                    Json(ApiResponse::<()>::failure(RATE_LIMIT_MESSAGE)),
                )
                    .into_response();
            }
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
