//! System settings API handlers
//!
//! GET /settings, POST /settings. Admin-only. POST replaces the stored row
//! with the payload; absent fields clear, apart from the admin PIN, which
//! only changes when supplied non-empty. Changes take effect immediately
//! for credential resolution and mail delivery.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use mediavault_common::db::models::SystemSettings;
use mediavault_common::settings::SettingsUpdate;

use crate::api::auth::RequireAdmin;
use crate::error::ApiResult;
use crate::AppState;

/// GET /settings
pub async fn get_settings(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
) -> ApiResult<Json<SystemSettings>> {
    Ok(Json(state.settings.get().await))
}

/// POST /settings
pub async fn update_settings(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<SettingsUpdate>,
) -> ApiResult<Json<SystemSettings>> {
    let updated = state.settings.update(request).await?;
    tracing::info!("System settings updated");
    Ok(Json(updated))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", post(update_settings))
}
