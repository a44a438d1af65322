use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, SecurityConfig};
use crate::db::Store;

pub mod auth;
mod error;
mod ingredients;
mod observability;
mod recipes;
mod system;
mod tags;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub config: Config,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn security(&self) -> &SecurityConfig {
        &self.config.security
    }

    #[must_use]
    pub fn media_path(&self) -> &Path {
        Path::new(&self.config.media.media_path)
    }
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(Arc::new(AppState {
        store,
        config,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let media_path = state.config.media.media_path.clone();
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health-check", get(system::health_check))
        .route("/users/create", post(users::create_user))
        .route("/users/token", post(auth::create_token))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/media", tower_http::services::ServeDir::new(media_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(users::get_me))
        .route("/users/me", patch(users::update_me))
        .route("/recipes", get(recipes::list_recipes))
        .route("/recipes", post(recipes::create_recipe))
        .route("/recipes/{id}", get(recipes::get_recipe))
        .route("/recipes/{id}", put(recipes::replace_recipe))
        .route("/recipes/{id}", patch(recipes::patch_recipe))
        .route("/recipes/{id}", delete(recipes::delete_recipe))
        .route("/recipes/{id}/upload-image", post(recipes::upload_image))
        .route("/tags", get(tags::list_tags))
        .route("/tags/{id}", get(tags::get_tag))
        .route("/tags/{id}", patch(tags::rename_tag))
        .route("/tags/{id}", delete(tags::delete_tag))
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/{id}", get(ingredients::get_ingredient))
        .route("/ingredients/{id}", patch(ingredients::rename_ingredient))
        .route("/ingredients/{id}", delete(ingredients::delete_ingredient))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
