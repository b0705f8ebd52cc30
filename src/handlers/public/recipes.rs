// handlers/public/recipes.rs - Recipe listings and details

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{parse_order, RecipeDetail, RecipeFilter, RecipeSort};
use crate::database::pagination::PageQuery;
use crate::handlers::{ensure_any, page_request, path_params};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RecipeService;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub filters: Option<String>,
}

/// GET /recipes/list - Newest first
///
/// ```json
/// { "recipes": [{ "id_receitas": 1, "imagem": "https://...", "nome_da_receita": "Bolo",
///   "introducao": "...", "alimentacao": "vegana" }], "totalRecipes": 1 }
/// ```
pub async fn list(State(state): State<AppState>, Query(page): Query<PageQuery>) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let recipes = RecipeService::new(state.pool.clone()).fetch_list(page).await?;
    Ok(ApiResponse::success(json!({
        "recipes": recipes.items,
        "totalRecipes": recipes.total,
    })))
}

/// GET /recipes/search/:term - Name, introduction or ingredient contains the term
pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let recipes = RecipeService::new(state.pool.clone()).search(&term, page).await?;
    let recipes = ensure_any(recipes.total, "Não existem receitas com esse termo", recipes)?;
    Ok(ApiResponse::success(json!({
        "recipes": recipes.items,
        "totalSearchedRecipes": recipes.total,
    })))
}

/// GET /recipes/sort?order=recent|oldest|bestRated
pub async fn sort(
    State(state): State<AppState>,
    Query(order): Query<OrderQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let order = parse_order(order.order.as_deref(), RecipeSort::parse)?;
    let page = page_request(&state, &page)?;
    let recipes = RecipeService::new(state.pool.clone()).sort(order, page).await?;
    Ok(ApiResponse::success(json!({
        "recipes": recipes.items,
        "totalSortedRecipes": recipes.total,
    })))
}

/// GET /recipes/filter?filters={...}
///
/// ```json
/// { "categoria": ["cafe", "almocoEJantar"], "alimentacao": ["vegana"], "publicadoPor": ["nutricionistas"] }
/// ```
pub async fn filter(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let filter = RecipeFilter::parse(query.filters.as_deref())?;
    let page = page_request(&state, &page)?;
    let recipes = RecipeService::new(state.pool.clone()).filter(&filter, page).await?;
    let recipes = ensure_any(recipes.total, "Não existem receitas com esses filtros", recipes)?;
    Ok(ApiResponse::success(json!({
        "recipes": recipes.items,
        "totalFilteredRecipes": recipes.total,
    })))
}

/// GET /recipes/recent-by-nutritionists
pub async fn recent_by_nutritionists(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let recipes = RecipeService::new(state.pool.clone())
        .recent_by_nutritionists(page)
        .await?;
    Ok(ApiResponse::success(json!({
        "recentNutritionistsRecipes": recipes.items,
        "totalRecentNutritionistsRecipes": recipes.total,
    })))
}

/// GET /recipes/details/:id - Recipe with author, categories, steps, ingredients and ratings
pub async fn details(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<RecipeDetail> {
    let id = path_params(id)?;
    let recipe = RecipeService::new(state.pool.clone()).fetch_by_id(id).await?;
    Ok(ApiResponse::success(recipe))
}
