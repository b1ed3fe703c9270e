//! Database models and schema initialization

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;

use crate::{Error, Result};

/// Parse an RFC 3339 timestamp column.
///
/// Timestamps are stored as TEXT and always bound explicitly on insert, so
/// a parse failure means the row was written by something else.
pub fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| Error::Internal(format!("invalid timestamp in database: {}", e)))
}
