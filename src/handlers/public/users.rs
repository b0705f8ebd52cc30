// handlers/public/users.rs - Registration, login and public profiles

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::{NewAccount, NewUser, NutritionistProfileInput, Role};
use crate::database::pagination::PageQuery;
use crate::error::ApiError;
use crate::handlers::{json_body, page_request, path_params};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::EMAIL_TAKEN;
use crate::services::UserService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
    pub tipo: Option<String>,
    pub crn: Option<String>,
    pub foco: Option<String>,
    pub formacao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub senha: Option<String>,
}

/// POST /users/register - Create a member or nutritionist account
///
/// ```json
/// { "nome": "Ana", "email": "ana@example.com", "senha": "s3cret", "tipo": "nutricionista",
///   "crn": "CRN-3 12345", "foco": "vegana", "formacao": "USP" }
/// ```
///
/// `crn`, `foco` and `formacao` are required only for `"tipo": "nutricionista"`.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;

    let (Some(name), Some(email), Some(password), Some(tipo)) = (
        present(body.nome),
        present(body.email),
        body.senha.filter(|s| !s.is_empty()),
        present(body.tipo),
    ) else {
        return Err(ApiError::bad_request("Campos de usuário estão faltando."));
    };

    let role = Role::parse(&tipo).ok_or_else(|| ApiError::bad_request("Tipo de usuário inválido."))?;

    let profile = match role {
        Role::Member => None,
        Role::Nutritionist => {
            let (Some(crn), Some(focus), Some(education)) =
                (present(body.crn), present(body.foco), present(body.formacao))
            else {
                return Err(ApiError::bad_request("Campos de nutricionista estão faltando."));
            };
            Some(NutritionistProfileInput { crn, education, focus })
        }
    };

    let service = UserService::new(state.pool.clone());
    if service.email_exists(&email).await? {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let password_hash = hash_password(password).await.map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Erro ao cadastrar usuário.")
    })?;

    let user = NewUser { name, email, password_hash };
    let account = match profile {
        None => NewAccount::Member(user),
        Some(profile) => NewAccount::Nutritionist(user, profile),
    };
    service.register(account).await?;

    let message = match role {
        Role::Member => "O membro foi cadastrado com sucesso",
        Role::Nutritionist => "O nutricionista foi cadastrado com sucesso",
    };
    Ok(ApiResponse::created(json!({ "message": message })))
}

/// POST /users/login - Exchange credentials for a JWT
///
/// ```json
/// { "email": "ana@example.com", "senha": "s3cret" }
/// ```
///
/// Response: `{ "token": "eyJhbGciOi...", "message": "Login bem-sucedido!" }`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;
    let (Some(email), Some(password)) = (present(body.email), body.senha.filter(|s| !s.is_empty())) else {
        return Err(ApiError::bad_request("Email e senha são obrigatórios."));
    };

    let service = UserService::new(state.pool.clone());
    let record = service
        .find_for_login(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request("Usuário não encontrado."))?;

    let valid = verify_password(password, record.password_hash.clone())
        .await
        .map_err(|e| {
            tracing::error!("Password verification failed: {}", e);
            ApiError::internal_server_error("Erro ao realizar login.")
        })?;
    if !valid {
        warn!("Rejected login for user {}", record.id);
        return Err(ApiError::bad_request("Senha inválida."));
    }

    let role = Role::parse(&record.role).ok_or_else(|| {
        tracing::error!("User {} has unknown role {}", record.id, record.role);
        ApiError::internal_server_error("Erro ao realizar login.")
    })?;

    let claims = Claims::new(
        record.id,
        role,
        record.name,
        record.profile_picture,
        state.config.security.jwt_expiry_secs,
    );
    let token = generate_jwt(&claims, &state.config.security.jwt_secret).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Erro ao realizar login.")
    })?;

    info!("User {} logged in", record.id);
    Ok(ApiResponse::success(json!({ "token": token, "message": "Login bem-sucedido!" })))
}

/// GET /users/details/:id - Public profile (`userData`)
pub async fn details(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let id = path_params(id)?;
    let user = UserService::new(state.pool.clone()).fetch_by_id(id).await?;
    Ok(ApiResponse::success(json!({ "userData": user })))
}

/// GET /users/:id/recipes/published
pub async fn published_recipes(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let id = path_params(id)?;
    let page = page_request(&state, &page)?;
    let recipes = UserService::new(state.pool.clone()).published_recipes(id, page).await?;
    Ok(ApiResponse::success(json!({
        "userRecipes": recipes.items,
        "totalUserRecipes": recipes.total,
    })))
}

/// GET /users/:id/articles/published
pub async fn published_articles(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let id = path_params(id)?;
    let page = page_request(&state, &page)?;
    let articles = UserService::new(state.pool.clone()).published_articles(id, page).await?;
    Ok(ApiResponse::success(json!({
        "userArticles": articles.items,
        "totalUserArticles": articles.total,
    })))
}

/// Trimmed, non-empty value. Passwords are taken verbatim instead.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
