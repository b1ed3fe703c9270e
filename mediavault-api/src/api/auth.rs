//! Authentication API handlers and request extractors
//!
//! POST /auth/login exchanges a PIN for a signed bearer token. The
//! `AuthToken` and `RequireAdmin` extractors gate every other handler:
//! `AuthToken` demands a valid bearer token, `RequireAdmin` additionally
//! demands the admin role. Both reject with the standard error envelope.

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    routing::post,
    Json, Router,
};
use mediavault_common::auth::{authorize, resolve_credential, Capability, Claims, Role};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, error::ApiResult, AppState};

/// POST /auth/login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
}

/// POST /auth/login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
}

/// POST /auth/login
///
/// Resolve the submitted PIN against the admin credential (settings
/// override first, static PIN second) and the active guest roster, and
/// issue a bearer token for the matched principal. The PIN itself is
/// never logged.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let credential = resolve_credential(
        &state.db,
        &state.settings,
        &state.config.access_pin,
        &request.pin,
    )
    .await?;

    let access_token = state.tokens.issue(&credential.subject, credential.role)?;
    tracing::info!(
        "Issued {} token for subject {}",
        credential.role,
        credential.subject
    );

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        role: credential.role,
    }))
}

/// Build authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Extractor: a valid bearer token. Carries the verified claims.
#[derive(Debug, Clone)]
pub struct AuthToken(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Authorization header is not a bearer token".to_string())
        })?;

        let claims = state.tokens.validate(token)?;
        Ok(AuthToken(claims))
    }
}

/// Extractor: a valid bearer token whose principal is the administrator.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthToken(claims) = AuthToken::from_request_parts(parts, state).await?;
        authorize(claims.role, Capability::AdminOnly)?;
        Ok(RequireAdmin(claims))
    }
}
