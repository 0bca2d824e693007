//! Signing and checking of the bearer tokens handed to clients.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reset tokens are only good for an hour
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Session,
    Reset,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user ID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so two tokens issued in the same second still differ
    pub jti: String,
    pub purpose: TokenPurpose,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("Token validation failed: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("Token was issued for {0:?} use")]
    WrongPurpose(TokenPurpose),
}

/// Issues and validates HS256 tokens with a shared secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, session_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl,
        }
    }

    pub fn issue_session(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue(user_id, TokenPurpose::Session, self.session_ttl)
    }

    pub fn issue_reset(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue(user_id, TokenPurpose::Reset, Duration::minutes(RESET_TOKEN_TTL_MINUTES))
    }

    fn issue(&self, user_id: &str, purpose: TokenPurpose, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            purpose,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Checks signature, expiry and purpose, returning the claims
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?
            .claims;

        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose(claims.purpose));
        }
        Ok(claims)
    }
}
