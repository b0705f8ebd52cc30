// handlers/protected/recipes.rs - Recipe create/delete and ratings

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::{Category, NewRecipe, RatingOutcome};
use crate::error::ApiError;
use crate::handlers::{ensure_caller, json_body, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::RecipeService;
use crate::storage::release_image;
use crate::upload::MultipartForm;
use crate::AppState;

const RECIPE_IMAGE: &str = "imagem";
const MISSING_FIELDS: &str = "Preencha todos os campos obrigatórios.";

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub nota: Option<i64>,
    #[serde(rename = "idUsuario")]
    pub id_usuario: Option<i64>,
    #[serde(rename = "idReceita")]
    pub id_receita: Option<i64>,
}

/// `{ "value": "..." }` entries of the ingredient and step lists
#[derive(Debug, Deserialize)]
struct ListItem {
    value: String,
}

/// POST /recipes/create
///
/// Multipart fields:
/// - `nome`, `introducao`, `tempo`, `rendimento`, `alimentacao`
/// - `categoria`: repeated, or one JSON array (`["cafe","almoco_jantar"]`)
/// - `ingrediente`, `modoDePreparo`: JSON `[{"value":"2 ovos"}]`, kept in order
/// - `idUsuario` (optional, must be the caller)
/// - file `imagem` (optional, JPEG)
///
/// Response (201): `{ "message": "Receita criada com sucesso!", "idReceita": 42 }`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let mut form = MultipartForm::read(
        multipart,
        &[RECIPE_IMAGE],
        state.config.storage.max_upload_bytes,
    )
    .await?;

    // Everything is validated before the image leaves the process
    let mut recipe = recipe_from_form(&form, &user)?;

    let mut stored = form.store_images(state.images.as_ref()).await?;
    recipe.image = stored.remove(RECIPE_IMAGE);

    let service = RecipeService::new(state.pool.clone());
    let id = match service.create(&recipe).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(image) = &recipe.image {
                release_image(state.images.as_ref(), &image.public_id).await;
            }
            return Err(e.into());
        }
    };

    Ok(ApiResponse::created(json!({
        "message": "Receita criada com sucesso!",
        "idReceita": id,
    })))
}

/// DELETE /recipes/delete/:id/:userId - Owner-only; the image is released afterwards
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let (id, user_id) = path_params(ids)?;
    ensure_caller(user_id, &user, "Você não tem permissão para excluir esta receita.")?;

    let image_id = RecipeService::new(state.pool.clone()).remove(id, user_id).await?;
    if let Some(image_id) = image_id {
        release_image(state.images.as_ref(), &image_id).await;
    }

    Ok(ApiResponse::success(json!({ "message": "Receita excluída com sucesso!" })))
}

/// POST /recipes/rate
///
/// ```json
/// { "nota": 5, "idUsuario": 3, "idReceita": 42 }
/// ```
///
/// A repeat rating answers `{ "success": false, "message": "Você já avaliou esta receita." }`.
pub async fn rate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> ApiResult<RatingOutcome> {
    let body = json_body(payload)?;
    let (Some(score), Some(user_id), Some(recipe_id)) = (body.nota, body.id_usuario, body.id_receita) else {
        return Err(ApiError::bad_request("Todos os campos são obrigatórios!"));
    };
    ensure_caller(user_id, &user, "Você não pode avaliar em nome de outro usuário.")?;

    let outcome = RecipeService::new(state.pool.clone())
        .add_rating(recipe_id, user_id, score)
        .await?;
    info!("User {} rated recipe {}: {}", user_id, recipe_id, outcome.message);
    Ok(ApiResponse::success(outcome))
}

fn recipe_from_form(form: &MultipartForm, user: &AuthUser) -> Result<NewRecipe, ApiError> {
    const REQUIRED: [&str; 7] = [
        "nome",
        "introducao",
        "tempo",
        "rendimento",
        "alimentacao",
        "ingrediente",
        "modoDePreparo",
    ];

    let mut missing: Vec<&str> = REQUIRED.iter().copied().filter(|f| form.text(f).is_none()).collect();
    if form.texts("categoria").is_empty() {
        missing.push("categoria");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &missing));
    }

    let user_id = match form.text("idUsuario") {
        None => user.id,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("idUsuario inválido."))?,
    };
    ensure_caller(user_id, user, "Você não pode publicar receitas em nome de outro usuário.")?;

    let categories = parse_categories(form.texts("categoria"))?;
    let ingredients = parse_items(form.text("ingrediente").unwrap_or_default(), "ingrediente")?;
    let steps = parse_items(form.text("modoDePreparo").unwrap_or_default(), "modoDePreparo")?;

    let text = |name: &str| form.text(name).unwrap_or_default().to_string();
    Ok(NewRecipe {
        name: text("nome"),
        intro: text("introducao"),
        prep_time: text("tempo"),
        yield_amount: text("rendimento"),
        diet_type: text("alimentacao"),
        categories,
        ingredients,
        steps,
        user_id,
        image: None,
    })
}

/// Accepts repeated values and/or JSON arrays, in either vocabulary
fn parse_categories(values: &[String]) -> Result<Vec<Category>, ApiError> {
    let mut categories = Vec::new();
    for raw in values {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let names: Vec<String> = if raw.starts_with('[') {
            serde_json::from_str(raw).map_err(|_| ApiError::bad_request("Categoria inválida."))?
        } else {
            vec![raw.to_string()]
        };
        for name in names {
            let category = Category::from_form(name.trim())
                .ok_or_else(|| ApiError::bad_request(format!("Categoria inválida: {}", name)))?;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }
    if categories.is_empty() {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &["categoria"]));
    }
    Ok(categories)
}

/// `[{"value": ...}]` into the non-blank values, order preserved
fn parse_items(raw: &str, field: &'static str) -> Result<Vec<String>, ApiError> {
    let items: Vec<ListItem> = serde_json::from_str(raw)
        .map_err(|_| ApiError::bad_request(format!("Formato inválido para {}.", field)))?;
    let values: Vec<String> = items
        .into_iter()
        .map(|item| item.value.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(ApiError::missing_fields(MISSING_FIELDS, &[field]));
    }
    Ok(values)
}
