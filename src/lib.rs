pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod storage;
pub mod upload;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::middleware::{jwt_auth_middleware, require_nutritionist};
use crate::storage::ImageStore;

/// Shared per-process dependencies, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub images: Arc<dyn ImageStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, images: Arc<dyn ImageStore>, config: AppConfig) -> Self {
        Self { pool, images, config: Arc::new(config) }
    }
}

/// Full application router
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(user_routes(&state))
        .merge(recipe_routes(&state))
        .merge(article_routes(&state))
        .merge(nutritionist_routes())
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::{protected, public};

    let public = Router::new()
        .route("/users/register", post(public::users::register))
        .route("/users/login", post(public::users::login))
        .route("/users/details/:id", get(public::users::details))
        .route("/users/:id/recipes/published", get(public::users::published_recipes))
        .route("/users/:id/articles/published", get(public::users::published_articles));

    let authenticated = Router::new()
        .route("/users/update-pictures/:profile_id/:user_id", put(protected::users::update_pictures))
        .route("/users/update-member/:profile_id/:user_id", put(protected::users::update_member))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // Layers run outside-in: token first, then role
    let nutritionist = Router::new()
        .route(
            "/users/update-nutritionist/:profile_id/:user_id",
            put(protected::users::update_nutritionist),
        )
        .route_layer(from_fn(require_nutritionist))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    public.merge(authenticated).merge(nutritionist)
}

fn recipe_routes(state: &AppState) -> Router<AppState> {
    use handlers::{protected, public};

    let public = Router::new()
        .route("/recipes/list", get(public::recipes::list))
        .route("/recipes/search/:term", get(public::recipes::search))
        .route("/recipes/sort", get(public::recipes::sort))
        .route("/recipes/filter", get(public::recipes::filter))
        .route("/recipes/recent-by-nutritionists", get(public::recipes::recent_by_nutritionists))
        .route("/recipes/details/:id", get(public::recipes::details));

    let authenticated = Router::new()
        .route("/recipes/create", post(protected::recipes::create))
        .route("/recipes/delete/:id/:user_id", delete(protected::recipes::delete))
        .route("/recipes/rate", post(protected::recipes::rate))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    public.merge(authenticated)
}

fn article_routes(state: &AppState) -> Router<AppState> {
    use handlers::{protected, public};

    let public = Router::new()
        .route("/articles/list", get(public::articles::list))
        .route("/articles/search/:term", get(public::articles::search))
        .route("/articles/sort", get(public::articles::sort))
        .route("/articles/details/:id", get(public::articles::details));

    let nutritionist = Router::new()
        .route("/articles/create", post(protected::articles::create))
        .route(
            "/articles/delete/:article_id/:nutritionist_id",
            delete(protected::articles::delete),
        )
        .route_layer(from_fn(require_nutritionist))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    public.merge(nutritionist)
}

fn nutritionist_routes() -> Router<AppState> {
    use handlers::public::nutritionists;

    Router::new()
        .route("/nutritionists/list", get(nutritionists::list))
        .route("/nutritionists/search/:term", get(nutritionists::search))
        .route("/nutritionists/sort", get(nutritionists::sort))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Nutri API",
        "version": version,
        "description": "Recipes, articles and nutritionist profiles",
        "endpoints": {
            "users": "/users/* (register, login, profiles; updates require a token)",
            "recipes": "/recipes/* (listing public; create, delete and rate require a token)",
            "articles": "/articles/* (listing public; create and delete are nutritionist-only)",
            "nutritionists": "/nutritionists/* (public)",
            "health": "/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
