//! Database models

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media classification. Stored as lowercase TEXT in the media table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            other => Err(Error::InvalidInput(format!(
                "unknown media type: {}",
                other
            ))),
        }
    }
}

/// Invited guest. The PIN is the guest's only credential; it is generated
/// server-side at creation and surfaced again only to the administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub pin: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Cataloged media item. `related_to_id` links an audio track to its parent
/// video; the tree is two levels deep at most.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub media_type: MediaType,
    pub related_to_id: Option<i64>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Singleton system settings row (id is always 1 in storage).
///
/// SMTP and sender fields feed the mailer; `admin_pin`, when non-empty,
/// shadows the statically configured admin PIN; `domain` is the public
/// origin placed in invitation links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSettings {
    pub smtp_host: Option<String>,
    pub smtp_port: i64,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub admin_pin: Option<String>,
    pub domain: Option<String>,
}

impl SystemSettings {
    /// Admin PIN override, if one is set and non-empty.
    pub fn admin_pin_override(&self) -> Option<&str> {
        self.admin_pin.as_deref().filter(|p| !p.is_empty())
    }
}
