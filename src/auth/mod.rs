//! Authentication: token issuing, password hashing and the request extractor
//! that turns a bearer token into the calling user.

mod jwt;
mod password;

pub use jwt::{Claims, RESET_TOKEN_TTL_MINUTES, TokenError, TokenIssuer, TokenPurpose};
pub use password::{PasswordError, hash_password, verify_password};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use tracing::debug;

use crate::AppState;
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;

pub const MISSING_TOKEN_MESSAGE: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token.";

/// The user a request was made by
///
/// Rejects with 401 when the `Authorization` header is missing, when the
/// token does not verify as a session token, or when its user is gone.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        ApiError::unauthorized(MISSING_TOKEN_MESSAGE)
                    } else {
                        ApiError::unauthorized(INVALID_TOKEN_MESSAGE)
                    }
                })?;

        let claims = state.tokens.verify(bearer.token(), TokenPurpose::Session).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized(INVALID_TOKEN_MESSAGE)
        })?;

        let user = repo::get_user(&state.pool, &claims.sub)?
            .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN_MESSAGE))?;

        Ok(AuthUser(user))
    }
}
