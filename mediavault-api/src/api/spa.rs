//! SPA fallback handler
//!
//! Requests no API route claims resolve against the on-disk frontend
//! bundle: an exact file match is served with its content type, anything
//! else gets index.html so client-side routing can take over. API paths
//! and static-mount misses never fall through to the bundle; they 404
//! with the JSON envelope.

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path as FsPath, PathBuf};

use crate::{error::ApiError, AppState};

/// Fallback for everything the API routers do not match.
pub async fn spa_fallback(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();

    if path == "/api" || path.starts_with("/api/") {
        return ApiError::NotFound(format!("no such endpoint: {}", path)).into_response();
    }
    if method != Method::GET && method != Method::HEAD {
        return ApiError::NotFound(format!("no such endpoint: {}", path)).into_response();
    }

    let static_dir = state.config.static_dir();
    let rel = path.trim_start_matches('/');

    if !rel.is_empty() {
        if let Some(candidate) = safe_join(&static_dir, rel) {
            if let Ok(bytes) = tokio::fs::read(&candidate).await {
                return file_response(&candidate, bytes);
            }
        }
    }

    let index = static_dir.join("index.html");
    match tokio::fs::read(&index).await {
        Ok(bytes) => file_response(&index, bytes),
        Err(_) => ApiError::NotFound(format!("no such path: {}", path)).into_response(),
    }
}

/// Not-found service for the static mount. `ServeDir` answers misses
/// itself instead of handing them back to the router fallback, so the
/// JSON envelope has to come from here.
pub async fn static_not_found() -> ApiError {
    ApiError::NotFound("no such static file".to_string())
}

/// Join a request path under the static root, rejecting anything that is
/// not a plain relative path (parent traversal, absolute components).
fn safe_join(root: &FsPath, rel: &str) -> Option<PathBuf> {
    let rel_path = FsPath::new(rel);
    if rel_path
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Some(root.join(rel_path))
    } else {
        None
    }
}

fn file_response(path: &FsPath, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for(path))],
        bytes,
    )
        .into_response()
}

fn content_type_for(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}
