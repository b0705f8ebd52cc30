// handlers/public/nutritionists.rs - Nutritionist directory

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::database::models::{parse_order, NutritionistSort};
use crate::database::pagination::PageQuery;
use crate::handlers::public::recipes::OrderQuery;
use crate::handlers::{ensure_any, page_request};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::NutritionistService;
use crate::AppState;

pub async fn list(State(state): State<AppState>, Query(page): Query<PageQuery>) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let nutritionists = NutritionistService::new(state.pool.clone()).fetch_list(page).await?;
    Ok(ApiResponse::success(json!({
        "nutritionists": nutritionists.items,
        "totalNutritionists": nutritionists.total,
    })))
}

pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let nutritionists = NutritionistService::new(state.pool.clone()).search(&term, page).await?;
    let nutritionists = ensure_any(
        nutritionists.total,
        "Não existem nutricionistas com esse termo.",
        nutritionists,
    )?;
    Ok(ApiResponse::success(json!({
        "nutritionists": nutritionists.items,
        "totalSearchedNutritionists": nutritionists.total,
    })))
}

/// GET /nutritionists/sort?order=vegan|vegetarian|veganAndVegetarian - Narrow by focus
pub async fn sort(
    State(state): State<AppState>,
    Query(order): Query<OrderQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let criterion = parse_order(order.order.as_deref(), NutritionistSort::parse)?;
    let page = page_request(&state, &page)?;
    let nutritionists = NutritionistService::new(state.pool.clone()).sort(criterion, page).await?;
    Ok(ApiResponse::success(json!({
        "nutritionists": nutritionists.items,
        "totalSortedNutritionists": nutritionists.total,
    })))
}
