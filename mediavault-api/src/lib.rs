//! mediavault-api library interface
//!
//! Exposes the router and state for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::handler::HandlerWithoutStateExt;
use axum::Router;
use chrono::{DateTime, Utc};
use mediavault_common::auth::TokenService;
use mediavault_common::config::AppConfig;
use mediavault_common::settings::SettingsStore;
use services::{CatalogEngine, MailerHandle, MediaStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Static process configuration
    pub config: Arc<AppConfig>,
    /// Cached system settings with write-through updates
    pub settings: SettingsStore,
    /// Access token issue/validate service
    pub tokens: TokenService,
    /// Media catalog engine (rows plus blobs)
    pub catalog: CatalogEngine,
    /// Invitation mail queue handle
    pub mailer: MailerHandle,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: AppConfig,
        settings: SettingsStore,
        tokens: TokenService,
        store: MediaStore,
        mailer: MailerHandle,
    ) -> Self {
        let catalog = CatalogEngine::new(db.clone(), store);
        Self {
            db,
            config: Arc::new(config),
            settings,
            tokens,
            catalog,
            mailer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Versioned API under /api/v1, health probes at the root, uploaded blobs
/// under /vault_static, and everything else falling through to the SPA
/// bundle.
pub fn build_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .merge(api::auth_routes())
        .merge(api::guest_routes())
        .merge(api::media_routes())
        .merge(api::settings_routes());

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(api::health_routes())
        .nest_service(
            "/vault_static",
            ServeDir::new(state.config.static_dir())
                .not_found_service(api::static_not_found.into_service()),
        )
        .fallback(api::spa_fallback)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
