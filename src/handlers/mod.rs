// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, some routes nutritionist-only).
// Route wiring lives in lib.rs; handlers only see State, extractors and,
// on protected routes, the AuthUser extension.

pub mod protected;
pub mod public;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::database::pagination::{PageQuery, PageRequest};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Resolve `?offset=&limit=` against the configured page sizes
pub(crate) fn page_request(state: &AppState, query: &PageQuery) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::from_query(query, &state.config.api)?)
}

/// Unwrap a JSON body, reporting malformed input in the API error shape
pub(crate) fn json_body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Unwrap path parameters, reporting non-numeric ids in the API error shape
pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// The user id a request acts for must be the token's own
pub(crate) fn ensure_caller(claimed_id: i64, user: &AuthUser, message: &str) -> Result<(), ApiError> {
    if claimed_id != user.id {
        tracing::warn!("User {} attempted to act as user {}", user.id, claimed_id);
        return Err(ApiError::forbidden(message));
    }
    Ok(())
}

/// Not-found for searches and filters that matched nothing at all
pub(crate) fn ensure_any<T>(total: i64, message: &str, value: T) -> Result<T, ApiError> {
    if total == 0 {
        return Err(ApiError::not_found(message));
    }
    Ok(value)
}
