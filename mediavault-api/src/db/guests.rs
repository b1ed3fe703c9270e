//! Guest database operations

use chrono::Utc;
use mediavault_common::db::models::Guest;
use mediavault_common::db::parse_timestamp;
use mediavault_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn row_to_guest(row: &SqliteRow) -> Result<Guest> {
    let created_at_str: String = row.get("created_at");
    Ok(Guest {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        pin: row.get("pin"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

/// Insert a new guest. The email uniqueness constraint is the duplicate
/// guard; a violation surfaces as `Conflict`.
pub async fn insert_guest(
    pool: &SqlitePool,
    email: &str,
    name: Option<&str>,
    pin: &str,
) -> Result<Guest> {
    let result = sqlx::query(
        r#"
        INSERT INTO guests (email, name, is_active, pin, created_at)
        VALUES (?, ?, 1, ?, ?)
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(pin)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| Error::from_db_unique(e, &format!("email already registered: {}", email)))?;

    let id = result.last_insert_rowid();
    get_guest(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("guest {} vanished after insert", id)))
}

/// Load a guest by id.
pub async fn get_guest(pool: &SqlitePool, id: i64) -> Result<Option<Guest>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, name, is_active, pin, created_at
        FROM guests
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_guest(&row)?)),
        None => Ok(None),
    }
}

/// List all guests, newest invitation first.
pub async fn list_guests(pool: &SqlitePool) -> Result<Vec<Guest>> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, name, is_active, pin, created_at
        FROM guests
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut guests = Vec::with_capacity(rows.len());
    for row in rows {
        guests.push(row_to_guest(&row)?);
    }
    Ok(guests)
}

/// Delete a guest by id. Returns false when no such guest exists.
pub async fn delete_guest(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM guests WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
