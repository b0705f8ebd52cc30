use axum::{extract::Request, middleware::Next, response::Response};
use tracing::warn;

use super::AuthUser;
use crate::error::ApiError;

/// Lets the request through only for nutritionists. Runs after `jwt_auth_middleware`.
pub async fn require_nutritionist(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Acesso negado. Token não fornecido."))?;

    if !user.is_nutritionist() {
        warn!("User {} ({}) denied nutritionist-only route", user.id, user.role);
        return Err(ApiError::forbidden(
            "Acesso negado! Apenas nutricionistas têm permissão para realizar esta ação.",
        ));
    }

    Ok(next.run(request).await)
}
