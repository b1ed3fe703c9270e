//! Physical media store
//!
//! Flat directory of uploaded blobs under `<root>/static/uploads`, addressed
//! by sanitized filename. The store knows nothing about the catalog; the
//! database row set is authoritative and the scan operation reconciles the
//! two.

use mediavault_common::Result;
use std::path::{Path, PathBuf};

/// Public URL prefix for stored blobs (the static mount plus the uploads
/// subdirectory).
pub const UPLOADS_URL_PREFIX: &str = "/vault_static/uploads";

/// File-store collaborator rooted at one upload directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
}

impl MediaStore {
    /// Create the store, ensuring the upload directory exists.
    pub fn init(upload_dir: PathBuf) -> Result<MediaStore> {
        std::fs::create_dir_all(&upload_dir)?;
        Ok(MediaStore { upload_dir })
    }

    /// Filesystem path of a named blob.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    /// Public URL of a named blob.
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, name)
    }

    /// Write a named blob, replacing any previous content.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(self.path_for(name), bytes).await?;
        Ok(())
    }

    /// Remove a named blob.
    pub async fn remove(&self, name: &str) -> Result<()> {
        tokio::fs::remove_file(self.path_for(name)).await?;
        Ok(())
    }

    /// Whether a named blob exists.
    pub async fn exists(&self, name: &str) -> bool {
        tokio::fs::metadata(self.path_for(name)).await.is_ok()
    }

    /// Names of all regular files in the store.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.upload_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}
