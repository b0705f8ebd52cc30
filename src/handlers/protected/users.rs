// handlers/protected/users.rs - Profile updates by the profile's own user
//
// Every route carries both the profile id and the acting user id; the acting
// id must be the token's, and the profile must be the caller's own. Both are
// checked before the multipart body is read.

use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::database::models::{MemberUpdate, NutritionistUpdate, PictureUpdate};
use crate::error::ApiError;
use crate::handlers::{ensure_caller, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{ensure_profile_owner, NOT_PROFILE_OWNER};
use crate::services::UserService;
use crate::storage::release_images;
use crate::upload::MultipartForm;
use crate::AppState;

const PROFILE_PICTURE: &str = "profilePicture";
const COVER_PICTURE: &str = "coverPicture";

const MISSING_FIELDS: &str = "Campos obrigatórios não fornecidos.";

/// PUT /users/update-pictures/:profileId/:userId
///
/// Multipart with `profilePicture` and/or `coverPicture` (JPEG). Replaced
/// images are released from the store once the row is updated.
pub async fn update_pictures(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let (profile_id, user_id) = path_params(ids)?;
    ensure_editor(profile_id, user_id, &user)?;

    let mut form = MultipartForm::read(
        multipart,
        &[PROFILE_PICTURE, COVER_PICTURE],
        state.config.storage.max_upload_bytes,
    )
    .await?;
    if !form.has_image(PROFILE_PICTURE) && !form.has_image(COVER_PICTURE) {
        return Err(ApiError::bad_request("Imagens não fornecidas."));
    }

    let mut stored = form.store_images(state.images.as_ref()).await?;
    let update = PictureUpdate {
        profile: stored.remove(PROFILE_PICTURE),
        cover: stored.remove(COVER_PICTURE),
    };

    let service = UserService::new(state.pool.clone());
    match service.update_pictures(profile_id, user_id, &update).await {
        Ok(replaced) => {
            release_images(state.images.as_ref(), replaced.iter().map(String::as_str)).await;
        }
        Err(e) => {
            let images = update.into_images();
            release_images(state.images.as_ref(), images.iter().map(|img| img.public_id.as_str())).await;
            return Err(e.into());
        }
    }

    Ok(ApiResponse::created(json!({ "message": "Sucesso ao atualizar fotos do usuário!" })))
}

/// PUT /users/update-member/:profileId/:userId - Multipart `name`, `email`
pub async fn update_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let (profile_id, user_id) = path_params(ids)?;
    ensure_editor(profile_id, user_id, &user)?;

    let form = MultipartForm::read(multipart, &[], state.config.storage.max_upload_bytes).await?;
    let (Some(name), Some(email)) = (form.text("name"), form.text("email")) else {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &["name", "email"]));
    };

    let update = MemberUpdate { name: name.to_string(), email: email.to_string() };
    UserService::new(state.pool.clone())
        .update_member(profile_id, user_id, &update)
        .await?;

    Ok(ApiResponse::created(json!({ "message": "Sucesso ao atualizar informações do membro!" })))
}

/// PUT /users/update-nutritionist/:profileId/:userId
///
/// Multipart `name`, `email`, `crn`, `education`, `focus` plus optional
/// `about`, `phone`, `website`, `instagram`, `linkedin`, `state`, `city`.
/// Optional fields sent as `""` or `"null"` are cleared.
pub async fn update_nutritionist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let (profile_id, user_id) = path_params(ids)?;
    ensure_editor(profile_id, user_id, &user)?;

    let form = MultipartForm::read(multipart, &[], state.config.storage.max_upload_bytes).await?;
    let update = nutritionist_update(&form)?;

    UserService::new(state.pool.clone())
        .update_nutritionist(profile_id, user_id, &update)
        .await?;

    Ok(ApiResponse::created(json!({ "message": "Sucesso ao atualizar informações do nutricionista!" })))
}

fn ensure_editor(profile_id: i64, user_id: i64, user: &AuthUser) -> Result<(), ApiError> {
    ensure_caller(user_id, user, NOT_PROFILE_OWNER)?;
    Ok(ensure_profile_owner(profile_id, user_id)?)
}

fn nutritionist_update(form: &MultipartForm) -> Result<NutritionistUpdate, ApiError> {
    const REQUIRED: [&str; 5] = ["name", "email", "crn", "education", "focus"];

    let missing: Vec<&str> = REQUIRED.iter().copied().filter(|f| form.text(f).is_none()).collect();
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &missing));
    }

    let required = |name: &str| form.text(name).unwrap_or_default().to_string();
    let optional = |name: &str| {
        form.text(name)
            .filter(|v| !v.eq_ignore_ascii_case("null"))
            .map(str::to_string)
    };

    Ok(NutritionistUpdate {
        name: required("name"),
        email: required("email"),
        crn: required("crn"),
        education: required("education"),
        focus: required("focus"),
        about: optional("about"),
        phone: optional("phone"),
        website: optional("website"),
        instagram: optional("instagram"),
        linkedin: optional("linkedin"),
        state: optional("state"),
        city: optional("city"),
    })
}
