//! Media catalog engine
//!
//! Owns the catalog's consistency rules: filename sanitization, parent
//! linkage and genre inheritance, upload atomicity, bulk genre reindexing,
//! and reconciliation of the physical store against the row set.
//!
//! Upload ordering is deliberate: the row is inserted first so the filename
//! uniqueness constraint acts as the atomic claim on the name, then the blob
//! is written. A failed blob write removes the row again. Two racing uploads
//! of one name therefore resolve to a single winner and a `Conflict` for the
//! loser, and no file is ever clobbered.

use crate::db::media::{self, NewMedia};
use crate::services::store::MediaStore;
use mediavault_common::db::models::{Media, MediaType};
use mediavault_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

/// Genre stamped on rows recovered from disk by a storage scan.
pub const RECOVERED_GENRE: &str = "Recovered";

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv"];

/// An upload about to enter the catalog.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Client-supplied name; sanitized before use.
    pub filename: String,
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub related_to_id: Option<i64>,
    pub title: Option<String>,
    pub genre: Option<String>,
}

/// Partial update. The outer Option is field presence (absent = untouched),
/// the inner is the new value (None clears).
#[derive(Debug, Clone, Default)]
pub struct MediaUpdate {
    pub title: Option<Option<String>>,
    pub genre: Option<Option<String>>,
    pub related_to_id: Option<Option<i64>>,
}

/// Derive a filesystem-safe name: spaces become underscores, path separator
/// characters are stripped. Returns None when nothing survives.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let sanitized: String = raw
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '/' | '\\' => None,
            other => Some(other),
        })
        .collect();
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

fn media_type_for_extension(name: &str) -> Option<MediaType> {
    let ext = std::path::Path::new(name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaType::Audio)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaType::Video)
    } else {
        None
    }
}

/// The media catalog: database row set plus physical store.
#[derive(Debug, Clone)]
pub struct CatalogEngine {
    db: SqlitePool,
    store: MediaStore,
}

impl CatalogEngine {
    pub fn new(db: SqlitePool, store: MediaStore) -> CatalogEngine {
        CatalogEngine { db, store }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Catalog an upload and write its blob.
    ///
    /// A parent's non-empty genre overwrites whatever genre the caller
    /// supplied; the parent's tag always wins.
    pub async fn upload(&self, req: UploadRequest) -> Result<Media> {
        let filename = sanitize_filename(&req.filename)
            .ok_or_else(|| Error::InvalidInput("filename is empty after sanitization".to_string()))?;

        let mut genre = req.genre;
        if let Some(parent_id) = req.related_to_id {
            let parent = media::get_media(&self.db, parent_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("media {}", parent_id)))?;
            if let Some(parent_genre) = parent.genre.as_deref().filter(|g| !g.is_empty()) {
                genre = Some(parent_genre.to_string());
            }
        }

        let url = self.store.url_for(&filename);
        let item = media::insert_media(
            &self.db,
            &NewMedia {
                filename: &filename,
                url: &url,
                media_type: req.media_type,
                related_to_id: req.related_to_id,
                title: req.title.as_deref(),
                genre: genre.as_deref(),
            },
        )
        .await?;

        // The name is claimed; write the blob, compensating on failure so
        // the catalog never points at bytes that were never stored.
        if let Err(write_err) = self.store.write(&filename, &req.bytes).await {
            if let Err(cleanup_err) = media::delete_media(&self.db, item.id).await {
                error!(
                    "Failed to remove catalog row {} after blob write failure: {}",
                    item.id, cleanup_err
                );
            }
            return Err(write_err);
        }

        info!("Cataloged {} upload: {}", item.media_type, item.filename);
        Ok(item)
    }

    /// All media of one type, newest first.
    pub async fn list(&self, media_type: MediaType) -> Result<Vec<Media>> {
        media::list_media_by_type(&self.db, media_type).await
    }

    /// Apply a partial update. Supplied parent ids must reference an
    /// existing row.
    pub async fn update(&self, id: i64, update: MediaUpdate) -> Result<Media> {
        let mut item = media::get_media(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("media {}", id)))?;

        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(genre) = update.genre {
            item.genre = genre;
        }
        if let Some(parent) = update.related_to_id {
            if let Some(parent_id) = parent {
                if media::get_media(&self.db, parent_id).await?.is_none() {
                    return Err(Error::NotFound(format!("media {}", parent_id)));
                }
            }
            item.related_to_id = parent;
        }

        media::save_media_fields(&self.db, &item).await?;
        Ok(item)
    }

    /// Remove a catalog row, then best-effort remove its blob. Row removal
    /// is authoritative; a failed file removal is logged and swallowed.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let item = media::get_media(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("media {}", id)))?;

        media::delete_media(&self.db, id).await?;

        if let Err(e) = self.store.remove(&item.filename).await {
            warn!("Could not remove media file {}: {}", item.filename, e);
        }
        Ok(())
    }

    /// Re-sync every audio child's genre with its parent's. Idempotent;
    /// returns the number of rows changed.
    pub async fn reindex(&self) -> Result<u64> {
        let updated = media::reindex_genres(&self.db).await?;
        info!("Genre reindex updated {} media item(s)", updated);
        Ok(updated)
    }

    /// Catalog files present in the store but missing from the database.
    /// Recognized extensions get a row with the filename as title and the
    /// recovery genre; anything else is skipped. Returns rows added.
    pub async fn scan(&self) -> Result<u64> {
        let names = self.store.list().await?;
        let known = media::list_filenames(&self.db).await?;

        let mut added = 0u64;
        for name in names {
            if known.contains(&name) {
                continue;
            }
            let Some(media_type) = media_type_for_extension(&name) else {
                debug!("Scan skipping unrecognized file: {}", name);
                continue;
            };

            let url = self.store.url_for(&name);
            let new = NewMedia {
                filename: &name,
                url: &url,
                media_type,
                related_to_id: None,
                title: Some(&name),
                genre: Some(RECOVERED_GENRE),
            };
            match media::insert_media(&self.db, &new).await {
                Ok(_) => added += 1,
                // Another writer cataloged it between the snapshot and here
                Err(Error::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if added > 0 {
            info!("Storage scan recovered {} media item(s)", added);
        }
        Ok(added)
    }
}
