// handlers/public/articles.rs - Article listings and details

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::database::models::{parse_order, ArticleSort};
use crate::database::pagination::PageQuery;
use crate::handlers::public::recipes::OrderQuery;
use crate::handlers::{ensure_any, page_request, path_params};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ArticleService;
use crate::AppState;

/// GET /articles/list - Newest first
pub async fn list(State(state): State<AppState>, Query(page): Query<PageQuery>) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let articles = ArticleService::new(state.pool.clone()).fetch_list(page).await?;
    Ok(ApiResponse::success(json!({
        "articles": articles.items,
        "totalArticles": articles.total,
    })))
}

/// GET /articles/search/:term - Title contains the term
pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let page = page_request(&state, &page)?;
    let articles = ArticleService::new(state.pool.clone()).search(&term, page).await?;
    let articles = ensure_any(articles.total, "Não existem artigos com esse termo.", articles)?;
    Ok(ApiResponse::success(json!({
        "articles": articles.items,
        "totalSearchedArticles": articles.total,
    })))
}

/// GET /articles/sort?order=recent|oldest|mostViewed
pub async fn sort(
    State(state): State<AppState>,
    Query(order): Query<OrderQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Value> {
    let order = parse_order(order.order.as_deref(), ArticleSort::parse)?;
    let page = page_request(&state, &page)?;
    let articles = ArticleService::new(state.pool.clone()).sort(order, page).await?;
    Ok(ApiResponse::success(json!({
        "articles": articles.items,
        "totalSortedArticles": articles.total,
    })))
}

/// GET /articles/details/:id - Full article; each call counts one view
///
/// ```json
/// { "articleDetails": { "image": "https://...", "publicationDate": "2024-05-01T12:00:00Z",
///   "title": "...", "nutritionistId": 2, "text": "<p>...</p>", "viewCount": 14,
///   "nutritionistName": "Ana", "nutritionistProfilePicture": null, "nutritionistFocus": "vegana" } }
/// ```
pub async fn details(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let id = path_params(id)?;
    let article = ArticleService::new(state.pool.clone()).fetch_by_id(id).await?;
    Ok(ApiResponse::success(json!({ "articleDetails": article })))
}
