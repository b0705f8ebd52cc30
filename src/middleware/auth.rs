use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use tracing::{error, warn};

use crate::auth::{decode_jwt, Claims};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub name: String,
    pub profile_picture: Option<String>,
}

impl AuthUser {
    pub fn is_nutritionist(&self) -> bool {
        self.role == Role::Nutritionist
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.tipo,
            name: claims.nome,
            profile_picture: claims.foto_perfil,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(&headers)?;

    // Validate and decode JWT
    let claims = validate_jwt(token, &state.config.security.jwt_secret)?;

    // Convert claims to AuthUser and inject into request
    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the token: the second whitespace-separated word of the Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Acesso negado. Token não fornecido."))?;

    auth_header
        .to_str()
        .ok()
        .and_then(|value| value.split_whitespace().nth(1))
        .ok_or_else(|| ApiError::unauthorized("Acesso negado. Token inválido."))
}

/// Validate JWT token and extract claims
fn validate_jwt(token: &str, secret: &str) -> Result<Claims, ApiError> {
    if secret.is_empty() {
        error!("JWT secret not configured");
        return Err(ApiError::internal_server_error("Erro ao verificar o token."));
    }

    decode_jwt(token, secret).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            warn!("Rejected expired token");
            ApiError::unauthorized("Token expirado.")
        }
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            warn!("Rejected invalid token: {}", e);
            ApiError::unauthorized("Token inválido.")
        }
        _ => {
            error!("Token verification failed: {}", e);
            ApiError::internal_server_error("Erro ao verificar o token.")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_not_provided() {
        let err = extract_jwt_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Acesso negado. Token não fornecido.");
    }

    #[test]
    fn header_without_token_is_invalid() {
        let err = extract_jwt_from_headers(&headers("Bearer")).unwrap_err();
        assert_eq!(err.message(), "Acesso negado. Token inválido.");
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn verification_failures_are_classified() {
        let err = validate_jwt("garbage", "secret").unwrap_err();
        assert_eq!((err.status_code(), err.message()), (401, "Token inválido."));

        let expired = Claims::new(1, Role::Member, "x".into(), None, -120);
        let token = generate_jwt(&expired, "secret").unwrap();
        let err = validate_jwt(&token, "secret").unwrap_err();
        assert_eq!((err.status_code(), err.message()), (401, "Token expirado."));

        let err = validate_jwt(&token, "").unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
