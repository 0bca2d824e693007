/// Request extractors that answer bad input with the error envelope
///
/// axum's own `Json` and `Query` reject with a plain-text body. These wrap
/// them and turn the rejection into an `ApiError::BadRequest`, so a
/// malformed body or query string gets `{ success: false, error }` like
/// every other failure.
use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::ApiError;

/// A JSON request body
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string parameters
#[derive(FromRequestParts, Debug)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
