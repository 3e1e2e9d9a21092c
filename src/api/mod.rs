use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{BackendKind, Config};
use crate::services::{AdminService, AuthService, CatalogService, CatalogStore};
use crate::state::SharedState;

mod admin;
pub mod auth;
mod catalog;
mod error;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub fn catalog_store(&self) -> &Arc<CatalogStore> {
        &self.shared.catalog_store
    }

    #[must_use]
    pub fn admin(&self) -> &Arc<AdminService> {
        &self.shared.admin
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let upload_limit = config.storage.max_upload_mb * 1024 * 1024;

    let admin_routes = create_admin_router(state.clone(), upload_limit);

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_minutes,
        )));

    let api_router = Router::new()
        .nest("/admin", admin_routes)
        .route("/categories", get(catalog::list_categories))
        .route("/categories/refresh", post(catalog::refresh_categories))
        .route("/categories/{category}", get(catalog::category_models))
        .route(
            "/categories/{category}/products",
            get(catalog::category_products),
        )
        .route("/categories/{category}/{model}", get(catalog::model_products))
        .route("/products/{product}", get(catalog::product_detail))
        .route("/search", get(catalog::search))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::current_session))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let mut app = Router::new().nest("/api", api_router);

    let public_base = config.storage.public_base_url.trim_end_matches('/');
    if config.backend.kind == BackendKind::Sqlite && public_base.starts_with('/') {
        app = app.nest_service(
            public_base,
            tower_http::services::ServeDir::new(&config.storage.local_path),
        );
    }

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_admin_router(state: Arc<AppState>, upload_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/categories/{id}",
            get(admin::get_category)
                .put(admin::update_category)
                .delete(admin::delete_category),
        )
        .route(
            "/models",
            get(admin::list_models).post(admin::create_model),
        )
        .route(
            "/models/{id}",
            get(admin::get_model)
                .put(admin::update_model)
                .delete(admin::delete_model),
        )
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        // Room for the text fields next to the largest accepted file.
        .layer(DefaultBodyLimit::max(upload_limit + 64 * 1024))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
