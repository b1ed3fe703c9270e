//! Guest management API handlers
//!
//! POST /guests, GET /guests, DELETE /guests/:id. All admin-only. Creation
//! generates the guest's PIN server-side, returns it in the response for the
//! administrator, and queues the invitation email; delivery problems never
//! fail the request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use mediavault_common::auth::generate_pin;
use mediavault_common::db::models::Guest;
use serde::Deserialize;

use crate::api::auth::RequireAdmin;
use crate::db::guests;
use crate::error::{ApiError, ApiResult};
use crate::services::PinEmail;
use crate::AppState;

/// POST /guests request
#[derive(Debug, Deserialize)]
pub struct CreateGuestRequest {
    pub email: String,
    pub name: Option<String>,
}

/// POST /guests
///
/// Invite a guest: generate an eight-digit PIN, store the roster row, and
/// queue the invitation email. The full row (PIN included) goes back to the
/// administrator.
pub async fn create_guest(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateGuestRequest>,
) -> ApiResult<(StatusCode, Json<Guest>)> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "invalid email address: {}",
            request.email
        )));
    }

    let pin = generate_pin();
    let guest = guests::insert_guest(&state.db, email, request.name.as_deref(), &pin).await?;
    tracing::info!("Created guest {} ({})", guest.id, guest.email);

    state.mailer.dispatch(PinEmail {
        to: guest.email.clone(),
        pin: guest.pin.clone(),
        guest_name: guest.name.clone(),
    });

    Ok((StatusCode::CREATED, Json(guest)))
}

/// GET /guests
///
/// The roster, newest first.
pub async fn list_guests(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Guest>>> {
    let roster = guests::list_guests(&state.db).await?;
    Ok(Json(roster))
}

/// DELETE /guests/:id
///
/// Revoke a guest. Their PIN stops resolving immediately; tokens already
/// issued remain valid until expiry.
pub async fn delete_guest(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !guests::delete_guest(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("guest {}", id)));
    }
    tracing::info!("Deleted guest {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Build guest management routes
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/guests", post(create_guest))
        .route("/guests", get(list_guests))
        .route("/guests/:id", delete(delete_guest))
}
