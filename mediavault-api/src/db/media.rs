//! Media catalog database operations

use chrono::Utc;
use mediavault_common::db::models::{Media, MediaType};
use mediavault_common::db::parse_timestamp;
use mediavault_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

/// Fields of a media row to be inserted.
#[derive(Debug, Clone)]
pub struct NewMedia<'a> {
    pub filename: &'a str,
    pub url: &'a str,
    pub media_type: MediaType,
    pub related_to_id: Option<i64>,
    pub title: Option<&'a str>,
    pub genre: Option<&'a str>,
}

fn row_to_media(row: &SqliteRow) -> Result<Media> {
    let media_type_str: String = row.get("media_type");
    let created_at_str: String = row.get("created_at");
    Ok(Media {
        id: row.get("id"),
        filename: row.get("filename"),
        url: row.get("url"),
        media_type: media_type_str.parse()?,
        related_to_id: row.get("related_to_id"),
        title: row.get("title"),
        genre: row.get("genre"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

fn map_insert_error(e: sqlx::Error, filename: &str) -> Error {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("media filename already exists: {}", filename));
        }
        if db_err.is_foreign_key_violation() {
            return Error::NotFound("related media not found".to_string());
        }
    }
    Error::Database(e)
}

/// Insert a new media row. The filename uniqueness constraint is the atomic
/// claim on the name (`Conflict` on violation); the foreign key rejects a
/// dangling parent reference (`NotFound`).
pub async fn insert_media(pool: &SqlitePool, new: &NewMedia<'_>) -> Result<Media> {
    let result = sqlx::query(
        r#"
        INSERT INTO media (filename, url, media_type, related_to_id, title, genre, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.filename)
    .bind(new.url)
    .bind(new.media_type.as_str())
    .bind(new.related_to_id)
    .bind(new.title)
    .bind(new.genre)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, new.filename))?;

    let id = result.last_insert_rowid();
    get_media(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("media {} vanished after insert", id)))
}

/// Load a media row by id.
pub async fn get_media(pool: &SqlitePool, id: i64) -> Result<Option<Media>> {
    let row = sqlx::query(
        r#"
        SELECT id, filename, url, media_type, related_to_id, title, genre, created_at
        FROM media
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_media(&row)?)),
        None => Ok(None),
    }
}

/// List all media of one type, newest first.
pub async fn list_media_by_type(pool: &SqlitePool, media_type: MediaType) -> Result<Vec<Media>> {
    let rows = sqlx::query(
        r#"
        SELECT id, filename, url, media_type, related_to_id, title, genre, created_at
        FROM media
        WHERE media_type = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(media_type.as_str())
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(row_to_media(&row)?);
    }
    Ok(items)
}

/// Set of every cataloged filename (for storage reconciliation).
pub async fn list_filenames(pool: &SqlitePool) -> Result<HashSet<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT filename FROM media")
        .fetch_all(pool)
        .await?;
    Ok(names.into_iter().collect())
}

/// Persist the mutable fields of a media row (title, genre, parent link).
pub async fn save_media_fields(pool: &SqlitePool, media: &Media) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE media
        SET title = ?, genre = ?, related_to_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&media.title)
    .bind(&media.genre)
    .bind(media.related_to_id)
    .bind(media.id)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, &media.filename))?;

    Ok(())
}

/// Delete a media row by id. Returns false when no such row exists.
/// Children referencing the row get `related_to_id` nullified by the
/// foreign key's ON DELETE SET NULL action.
pub async fn delete_media(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite the genre of every audio child whose parent has a non-empty
/// genre differing from the child's. One statement, idempotent; returns the
/// number of rows changed.
pub async fn reindex_genres(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE media
        SET genre = (SELECT p.genre FROM media p WHERE p.id = media.related_to_id)
        WHERE media_type = 'audio'
          AND related_to_id IS NOT NULL
          AND EXISTS (
            SELECT 1 FROM media p
            WHERE p.id = media.related_to_id
              AND p.genre IS NOT NULL
              AND p.genre != ''
              AND (media.genre IS NULL OR media.genre != p.genre)
          )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediavault_common::db::init::init_memory_database;

    async fn insert_simple(
        pool: &SqlitePool,
        filename: &str,
        media_type: MediaType,
        related_to_id: Option<i64>,
        genre: Option<&str>,
    ) -> Media {
        insert_media(
            pool,
            &NewMedia {
                filename,
                url: &format!("/vault_static/uploads/{}", filename),
                media_type,
                related_to_id,
                title: None,
                genre,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_load_round_trip() {
        let pool = init_memory_database().await.unwrap();

        let media = insert_media(
            &pool,
            &NewMedia {
                filename: "concert.mp4",
                url: "/vault_static/uploads/concert.mp4",
                media_type: MediaType::Video,
                related_to_id: None,
                title: Some("Concert"),
                genre: Some("Jazz"),
            },
        )
        .await
        .unwrap();

        let loaded = get_media(&pool, media.id).await.unwrap().unwrap();
        assert_eq!(loaded.filename, "concert.mp4");
        assert_eq!(loaded.media_type, MediaType::Video);
        assert_eq!(loaded.title.as_deref(), Some("Concert"));
        assert_eq!(loaded.genre.as_deref(), Some("Jazz"));
        assert_eq!(loaded.created_at, media.created_at);
    }

    #[tokio::test]
    async fn duplicate_filename_is_a_conflict() {
        let pool = init_memory_database().await.unwrap();

        insert_simple(&pool, "track.mp3", MediaType::Audio, None, None).await;
        let err = insert_media(
            &pool,
            &NewMedia {
                filename: "track.mp3",
                url: "/vault_static/uploads/track.mp3",
                media_type: MediaType::Audio,
                related_to_id: None,
                title: None,
                genre: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn dangling_parent_maps_to_not_found() {
        let pool = init_memory_database().await.unwrap();

        let err = insert_media(
            &pool,
            &NewMedia {
                filename: "orphan.mp3",
                url: "/vault_static/uploads/orphan.mp3",
                media_type: MediaType::Audio,
                related_to_id: Some(999),
                title: None,
                genre: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_type_newest_first() {
        let pool = init_memory_database().await.unwrap();

        insert_simple(&pool, "a.mp4", MediaType::Video, None, None).await;
        insert_simple(&pool, "b.mp3", MediaType::Audio, None, None).await;
        insert_simple(&pool, "c.mp4", MediaType::Video, None, None).await;

        let videos = list_media_by_type(&pool, MediaType::Video).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].filename, "c.mp4");
        assert_eq!(videos[1].filename, "a.mp4");

        let audio = list_media_by_type(&pool, MediaType::Audio).await.unwrap();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].filename, "b.mp3");
    }

    #[tokio::test]
    async fn reindex_propagates_parent_genre_and_is_idempotent() {
        let pool = init_memory_database().await.unwrap();

        let jazz = insert_simple(&pool, "jazz.mp4", MediaType::Video, None, Some("Jazz")).await;
        let untagged =
            insert_simple(&pool, "untagged.mp4", MediaType::Video, None, None).await;

        insert_simple(&pool, "a.mp3", MediaType::Audio, Some(jazz.id), None).await;
        insert_simple(&pool, "b.mp3", MediaType::Audio, Some(jazz.id), Some("Rock")).await;
        insert_simple(&pool, "c.mp3", MediaType::Audio, Some(jazz.id), Some("Jazz")).await;
        insert_simple(&pool, "d.mp3", MediaType::Audio, Some(untagged.id), Some("Folk")).await;
        insert_simple(&pool, "e.mp3", MediaType::Audio, None, Some("Blues")).await;

        // a (null) and b (Rock) change; c already matches, d's parent is
        // untagged, e has no parent
        assert_eq!(reindex_genres(&pool).await.unwrap(), 2);

        let audio = list_media_by_type(&pool, MediaType::Audio).await.unwrap();
        for item in &audio {
            match item.filename.as_str() {
                "a.mp3" | "b.mp3" | "c.mp3" => {
                    assert_eq!(item.genre.as_deref(), Some("Jazz"), "{}", item.filename)
                }
                "d.mp3" => assert_eq!(item.genre.as_deref(), Some("Folk")),
                "e.mp3" => assert_eq!(item.genre.as_deref(), Some("Blues")),
                other => panic!("unexpected row {}", other),
            }
        }

        // Second run changes nothing
        assert_eq!(reindex_genres(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_media_fields_round_trips() {
        let pool = init_memory_database().await.unwrap();

        let parent = insert_simple(&pool, "v.mp4", MediaType::Video, None, None).await;
        let mut media = insert_simple(&pool, "t.mp3", MediaType::Audio, None, None).await;

        media.title = Some("Retitled".to_string());
        media.genre = Some("Ambient".to_string());
        media.related_to_id = Some(parent.id);
        save_media_fields(&pool, &media).await.unwrap();

        let loaded = get_media(&pool, media.id).await.unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Retitled"));
        assert_eq!(loaded.genre.as_deref(), Some("Ambient"));
        assert_eq!(loaded.related_to_id, Some(parent.id));
    }
}
