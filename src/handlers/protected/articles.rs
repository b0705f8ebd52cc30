// handlers/protected/articles.rs - Article create/delete (nutritionists only)

use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::database::models::NewArticle;
use crate::error::ApiError;
use crate::handlers::{ensure_caller, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ArticleService;
use crate::storage::release_image;
use crate::upload::MultipartForm;
use crate::AppState;

const ARTICLE_IMAGE: &str = "articleImage";
const MISSING_FIELDS: &str = "Preencha todos os campos obrigatórios.";

/// POST /articles/create
///
/// Multipart `articleTitle`, `articleText` (HTML, sanitized on save),
/// optional `nutritionistId` (must be the caller) and the required JPEG
/// `articleImage`.
///
/// Response (201): `{ "message": "Artigo criado com sucesso!", "articleId": 7 }`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let mut form = MultipartForm::read(
        multipart,
        &[ARTICLE_IMAGE],
        state.config.storage.max_upload_bytes,
    )
    .await?;

    let (Some(title), Some(body)) = (form.text("articleTitle"), form.text("articleText")) else {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &["articleTitle", "articleText"]));
    };
    if !form.has_image(ARTICLE_IMAGE) {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &[ARTICLE_IMAGE]));
    }
    let (title, body) = (title.to_string(), body.to_string());

    let nutritionist_id = match form.text("nutritionistId") {
        None => user.id,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("nutritionistId inválido."))?,
    };
    ensure_caller(nutritionist_id, &user, "Você não pode publicar artigos em nome de outro nutricionista.")?;

    let mut stored = form.store_images(state.images.as_ref()).await?;
    let image = stored
        .remove(ARTICLE_IMAGE)
        .ok_or_else(|| ApiError::missing_fields(MISSING_FIELDS, &[ARTICLE_IMAGE]))?;

    let article = NewArticle { title, body, nutritionist_id, image };
    let id = match ArticleService::new(state.pool.clone()).create(&article).await {
        Ok(id) => id,
        Err(e) => {
            release_image(state.images.as_ref(), &article.image.public_id).await;
            return Err(e.into());
        }
    };

    Ok(ApiResponse::created(json!({
        "message": "Artigo criado com sucesso!",
        "articleId": id,
    })))
}

/// DELETE /articles/delete/:articleId/:nutritionistId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let (article_id, nutritionist_id) = path_params(ids)?;
    ensure_caller(nutritionist_id, &user, "Você não tem permissão para excluir este artigo.")?;

    let image_id = ArticleService::new(state.pool.clone())
        .remove(article_id, nutritionist_id)
        .await?;
    release_image(state.images.as_ref(), &image_id).await;

    Ok(ApiResponse::success(json!({ "message": "Artigo excluído com sucesso!" })))
}
