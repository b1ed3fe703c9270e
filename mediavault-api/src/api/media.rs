//! Media catalog API handlers
//!
//! Upload is multipart (`file` plus text fields), listings are public,
//! everything that mutates the catalog is admin-only. PATCH uses presence
//! semantics: an absent field is untouched, an explicit null clears.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use mediavault_common::db::models::{Media, MediaType};
use serde::{Deserialize, Serialize};

use crate::api::auth::RequireAdmin;
use crate::error::{ApiError, ApiResult};
use crate::services::{MediaUpdate, UploadRequest};
use crate::AppState;

/// Upload size ceiling (512 MiB).
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// POST /media/reindex response
#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub updated: u64,
}

/// POST /media/scan response
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub added: u64,
}

/// PATCH /media/:id request (presence semantics)
///
/// The double Option distinguishes "field absent" (outer None, leave alone)
/// from "field null" (inner None, clear).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMediaRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub related_to_id: Option<Option<i64>>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// POST /media/upload
///
/// Multipart form: `file` (required), `media_type` (required, "video" or
/// "audio"), `related_to_id`, `title`, `genre`. Unknown parts are ignored.
pub async fn upload_media(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut media_type: Option<MediaType> = None;
    let mut related_to_id: Option<i64> = None;
    let mut title: Option<String> = None;
    let mut genre: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart request: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ApiError::BadRequest("file part requires a filename".to_string())
                    })?;
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read file part: {}", e))
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            "media_type" => {
                let text = read_text_part(field).await?;
                media_type = Some(text.trim().parse::<MediaType>()?);
            }
            "related_to_id" => {
                let text = read_text_part(field).await?;
                let text = text.trim();
                if !text.is_empty() {
                    related_to_id = Some(text.parse::<i64>().map_err(|_| {
                        ApiError::BadRequest(format!("invalid related_to_id: {}", text))
                    })?);
                }
            }
            "title" => {
                title = Some(read_text_part(field).await?).filter(|t| !t.trim().is_empty());
            }
            "genre" => {
                genre = Some(read_text_part(field).await?).filter(|g| !g.trim().is_empty());
            }
            other => {
                tracing::debug!("Ignoring unknown multipart field: {}", other);
            }
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("missing file part".to_string()))?;
    let media_type =
        media_type.ok_or_else(|| ApiError::BadRequest("missing media_type field".to_string()))?;

    let item = state
        .catalog
        .upload(UploadRequest {
            filename,
            bytes,
            media_type,
            related_to_id,
            title,
            genre,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn read_text_part(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read form field: {}", e)))
}

/// GET /media/videos
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<Vec<Media>>> {
    Ok(Json(state.catalog.list(MediaType::Video).await?))
}

/// GET /media/audio
pub async fn list_audio(State(state): State<AppState>) -> ApiResult<Json<Vec<Media>>> {
    Ok(Json(state.catalog.list(MediaType::Audio).await?))
}

/// PATCH /media/:id
pub async fn update_media(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMediaRequest>,
) -> ApiResult<Json<Media>> {
    let item = state
        .catalog
        .update(
            id,
            MediaUpdate {
                title: request.title,
                genre: request.genre,
                related_to_id: request.related_to_id,
            },
        )
        .await?;
    Ok(Json(item))
}

/// DELETE /media/:id
pub async fn delete_media(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete(id).await?;
    tracing::info!("Deleted media {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /media/reindex
pub async fn reindex_media(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
) -> ApiResult<Json<ReindexResponse>> {
    let updated = state.catalog.reindex().await?;
    Ok(Json(ReindexResponse { updated }))
}

/// POST /media/scan
pub async fn scan_media(
    RequireAdmin(_claims): RequireAdmin,
    State(state): State<AppState>,
) -> ApiResult<Json<ScanResponse>> {
    let added = state.catalog.scan().await?;
    Ok(Json(ScanResponse { added }))
}

/// Build media catalog routes
pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/media/upload",
            post(upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/media/videos", get(list_videos))
        .route("/media/audio", get(list_audio))
        .route("/media/reindex", post(reindex_media))
        .route("/media/scan", post(scan_media))
        .route("/media/:id", patch(update_media).delete(delete_media))
}
