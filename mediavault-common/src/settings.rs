//! System settings store
//!
//! Owns the singleton `system_settings` row. The row is ensured once at
//! construction and a snapshot is cached behind an async RwLock; read paths
//! never touch the database. Updates write through and hold the write lock
//! for the duration, so concurrent updates through one store serialize.

use crate::db::models::SystemSettings;
use crate::Result;
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Settings update payload. Every field except the admin PIN is assigned as
/// supplied: an absent field clears the stored value, with the port and TLS
/// flag falling back to their defaults. An absent or empty admin_pin leaves
/// the stored override alone, so it cannot be cleared accidentally by an
/// empty form field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i64>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: Option<bool>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub admin_pin: Option<String>,
    pub domain: Option<String>,
}

/// Cached accessor for the singleton settings row.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    db: SqlitePool,
    cached: Arc<RwLock<SystemSettings>>,
}

impl SettingsStore {
    /// Ensure the singleton row exists and load the initial snapshot.
    pub async fn init(db: SqlitePool) -> Result<SettingsStore> {
        sqlx::query("INSERT OR IGNORE INTO system_settings (id) VALUES (1)")
            .execute(&db)
            .await?;

        let snapshot = load_settings(&db).await?;
        info!("System settings loaded (smtp configured: {})", snapshot.smtp_host.is_some());

        Ok(SettingsStore {
            db,
            cached: Arc::new(RwLock::new(snapshot)),
        })
    }

    /// Current snapshot (cached; no database read).
    pub async fn get(&self) -> SystemSettings {
        self.cached.read().await.clone()
    }

    /// Replace the stored row with the supplied payload, write it through,
    /// and refresh the cache. Assignment is unconditional except for the
    /// admin PIN, which only changes when supplied non-empty.
    pub async fn update(&self, update: SettingsUpdate) -> Result<SystemSettings> {
        let mut guard = self.cached.write().await;

        let merged = SystemSettings {
            smtp_host: update.smtp_host.and_then(non_empty),
            smtp_port: update.smtp_port.unwrap_or(587),
            smtp_user: update.smtp_user.and_then(non_empty),
            smtp_password: update.smtp_password.and_then(non_empty),
            smtp_tls: update.smtp_tls.unwrap_or(true),
            sender_email: update.sender_email.and_then(non_empty),
            sender_name: update.sender_name.and_then(non_empty),
            // Empty PIN means "leave the override alone", not "clear it"
            admin_pin: update
                .admin_pin
                .and_then(non_empty)
                .or_else(|| guard.admin_pin.clone()),
            domain: update.domain.and_then(non_empty),
        };

        sqlx::query(
            r#"
            UPDATE system_settings
            SET smtp_host = ?, smtp_port = ?, smtp_user = ?, smtp_password = ?,
                smtp_tls = ?, sender_email = ?, sender_name = ?, admin_pin = ?,
                domain = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            "#,
        )
        .bind(&merged.smtp_host)
        .bind(merged.smtp_port)
        .bind(&merged.smtp_user)
        .bind(&merged.smtp_password)
        .bind(merged.smtp_tls)
        .bind(&merged.sender_email)
        .bind(&merged.sender_name)
        .bind(&merged.admin_pin)
        .bind(&merged.domain)
        .execute(&self.db)
        .await?;

        *guard = merged.clone();
        Ok(merged)
    }

    /// Re-read the row into the cache (for out-of-band writes).
    pub async fn refresh(&self) -> Result<SystemSettings> {
        let snapshot = load_settings(&self.db).await?;
        *self.cached.write().await = snapshot.clone();
        Ok(snapshot)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

async fn load_settings(db: &SqlitePool) -> Result<SystemSettings> {
    let row = sqlx::query(
        r#"
        SELECT smtp_host, smtp_port, smtp_user, smtp_password, smtp_tls,
               sender_email, sender_name, admin_pin, domain
        FROM system_settings
        WHERE id = 1
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(SystemSettings {
        smtp_host: row.get("smtp_host"),
        smtp_port: row.get("smtp_port"),
        smtp_user: row.get("smtp_user"),
        smtp_password: row.get("smtp_password"),
        smtp_tls: row.get("smtp_tls"),
        sender_email: row.get("sender_email"),
        sender_name: row.get("sender_name"),
        admin_pin: row.get("admin_pin"),
        domain: row.get("domain"),
    })
}
