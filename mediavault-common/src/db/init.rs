//! Database initialization
//!
//! Opens (creating if absent) the vault database and applies the idempotent
//! schema. Foreign keys and the WAL journal are set through connection
//! options so every pooled connection enforces them; the media table relies
//! on referential actions (ON DELETE SET NULL) firing on whichever
//! connection runs a delete.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Run the idempotent schema migrations (safe to call multiple times).
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_guests_table(pool).await?;
    create_media_table(pool).await?;
    create_system_settings_table(pool).await?;
    Ok(())
}

/// In-memory database with the full schema, for tests.
///
/// Pinned to a single connection: every connection to `sqlite::memory:`
/// gets its own private database, so a wider pool would see empty schemas.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_tables(&pool).await?;

    Ok(pool)
}

/// Create the guests table
///
/// Email uniqueness is a table constraint; duplicate invitations surface as
/// constraint violations, not application pre-checks.
pub async fn create_guests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            pin TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Login resolves guests by PIN
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_guests_pin ON guests(pin)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the media table
///
/// Filename uniqueness is the atomic claim on an upload name. The
/// parent/child link is a real foreign key: deleting a parent video
/// nullifies `related_to_id` on its audio children.
pub async fn create_media_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL,
            media_type TEXT NOT NULL CHECK (media_type IN ('video', 'audio')),
            related_to_id INTEGER REFERENCES media(id) ON DELETE SET NULL,
            title TEXT,
            genre TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_type ON media(media_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_related ON media(related_to_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the system_settings table
///
/// The CHECK on id makes the row a true singleton; at most one row can ever
/// materialize.
pub async fn create_system_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            smtp_host TEXT,
            smtp_port INTEGER NOT NULL DEFAULT 587,
            smtp_user TEXT,
            smtp_password TEXT,
            smtp_tls INTEGER NOT NULL DEFAULT 1,
            sender_email TEXT,
            sender_name TEXT,
            admin_pin TEXT,
            domain TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
