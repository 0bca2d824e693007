use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{Created, Reply, created};
use crate::AppState;
use crate::auth::{AuthUser, RESET_TOKEN_TTL_MINUTES, TokenPurpose, hash_password, verify_password};
use crate::dto::{
    ApiResponse, AuthPayload, ForgotPasswordDto, LoginDto, RegisterDto, ResetPasswordDto, UpdateUserDto, non_blank,
};
use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::models::{JsonValue, PasswordReset, User};
use crate::repo;

pub const RESET_LINK_SENT_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Handler for creating an account
///
/// This function handles POST requests to `/api/auth/register`.
///
/// ### Returns
///
/// The new user and a session token, with status 201
#[instrument(skip(state, payload))]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RegisterDto>,
) -> Result<Created<AuthPayload>, ApiError> {
    let (Some(name), Some(email), Some(password)) =
        (non_blank(payload.name), non_blank(payload.email), non_blank(payload.password))
    else {
        return Err(ApiError::bad_request("Please provide name, email, and password"));
    };

    if repo::find_user_by_email(&state.pool, &email)?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let user = repo::create_user(&state.pool, name, email, password_hash)?;
    let token = state.tokens.issue_session(user.get_id())?;

    info!("Registered user {}", user.get_id());
    Ok(created(AuthPayload { user, token }))
}

/// Handler for signing in
///
/// This function handles POST requests to `/api/auth/login`.
/// Unknown emails and wrong passwords get the same 401.
#[instrument(skip(state, payload))]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginDto>,
) -> Result<Reply<AuthPayload>, ApiError> {
    let (Some(email), Some(password)) = (non_blank(payload.email), non_blank(payload.password)) else {
        return Err(ApiError::bad_request("Please provide email and password"));
    };

    let user = repo::find_user_by_email(&state.pool, &email)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&password, user.get_password_hash())? {
        debug!("Wrong password for user {}", user.get_id());
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = repo::touch_last_login(&state.pool, user.get_id())?;
    let token = state.tokens.issue_session(user.get_id())?;

    info!("User {} logged in", user.get_id());
    Ok(Json(ApiResponse::ok(AuthPayload { user, token })))
}

/// Handler for `GET /api/auth/user`
pub async fn get_current_user_handler(AuthUser(user): AuthUser) -> Reply<User> {
    Json(ApiResponse::ok(user))
}

/// Handler for `PUT /api/auth/user`
///
/// Blank or absent fields keep their current value.
#[instrument(skip(state, user, payload), fields(user_id = %user.get_id()))]
pub async fn update_current_user_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<UpdateUserDto>,
) -> Result<Reply<User>, ApiError> {
    let preferences = match payload.preferences {
        None | Some(serde_json::Value::Null) => None,
        Some(value @ serde_json::Value::Object(_)) => Some(JsonValue(value)),
        Some(_) => return Err(ApiError::bad_request("Preferences must be an object")),
    };

    let user = repo::update_user_profile(&state.pool, user.get_id(), non_blank(payload.name), preferences)?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Handler for `POST /api/auth/forgot-password`
///
/// Answers the same way whether or not the email is known. For a known email
/// a one-hour reset token is stored; delivery is left to the operator's logs.
#[instrument(skip(state, payload))]
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ForgotPasswordDto>,
) -> Result<Reply<&'static str>, ApiError> {
    let email = non_blank(payload.email).ok_or_else(|| ApiError::bad_request("Please provide email"))?;

    if let Some(user) = repo::find_user_by_email(&state.pool, &email)? {
        let token = state.tokens.issue_reset(user.get_id())?;
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        repo::create_password_reset(&state.pool, &PasswordReset::new(user.get_id(), token, expires_at))?;
        info!(user_id = %user.get_id(), "Password reset token issued");
    }

    Ok(Json(ApiResponse::ok(RESET_LINK_SENT_MESSAGE)))
}

/// Handler for `POST /api/auth/reset-password`
///
/// The token must verify as a reset token and still be on file; it is
/// consumed on success.
#[instrument(skip(state, payload))]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ResetPasswordDto>,
) -> Result<Reply<&'static str>, ApiError> {
    let (Some(token), Some(password)) = (non_blank(payload.token), non_blank(payload.password)) else {
        return Err(ApiError::bad_request("Please provide token and password"));
    };

    state
        .tokens
        .verify(&token, TokenPurpose::Reset)
        .map_err(|_| ApiError::bad_request("Invalid or expired token"))?;

    let reset = repo::find_password_reset(&state.pool, &token)?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired token"))?;

    if reset.is_expired(Utc::now()) {
        return Err(ApiError::bad_request("Token expired"));
    }

    let password_hash = hash_password(&password)?;
    if !repo::redeem_password_reset(&state.pool, &token, reset.get_user_id(), password_hash)? {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    info!(user_id = %reset.get_user_id(), "Password reset");
    Ok(Json(ApiResponse::ok("Password reset successful")))
}

/// Handler for `POST /api/auth/logout`
///
/// Tokens are stateless, so this only confirms the caller was signed in.
pub async fn logout_handler(AuthUser(_user): AuthUser) -> Reply<&'static str> {
    Json(ApiResponse::ok("Logged out successfully"))
}
