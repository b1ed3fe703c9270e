//! PIN generation and credential resolution

use crate::auth::guard::Role;
use crate::settings::SettingsStore;
use crate::{Error, Result};
use rand::Rng;
use sqlx::SqlitePool;

/// Outcome of a successful PIN resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub role: Role,
    /// "admin", or the guest row id as a string.
    pub subject: String,
}

/// Generate a random 8-digit PIN. Leading zeros are allowed; the PIN is a
/// string, never a number.
pub fn generate_pin() -> String {
    let mut rng = rand::thread_rng();
    format!("{:08}", rng.gen_range(0..100_000_000u32))
}

/// Resolve a submitted PIN to a role and subject.
///
/// A non-empty admin PIN override in system settings shadows the static
/// admin PIN entirely; while an override is set, the static PIN grants
/// nothing. Guest lookup requires the active flag. Distinct guests sharing
/// a PIN are not guarded against; the oldest matching row wins.
pub async fn resolve_credential(
    db: &SqlitePool,
    settings: &SettingsStore,
    static_admin_pin: &str,
    submitted: &str,
) -> Result<Credential> {
    let snapshot = settings.get().await;
    let effective_admin_pin = snapshot.admin_pin_override().unwrap_or(static_admin_pin);

    if submitted == effective_admin_pin {
        return Ok(Credential {
            role: Role::Admin,
            subject: "admin".to_string(),
        });
    }

    let guest_id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM guests WHERE pin = ? AND is_active = 1 ORDER BY id LIMIT 1",
    )
    .bind(submitted)
    .fetch_optional(db)
    .await?;

    match guest_id {
        Some(id) => Ok(Credential {
            role: Role::Guest,
            subject: id.to_string(),
        }),
        None => Err(Error::InvalidCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::settings::{SettingsStore, SettingsUpdate};

    async fn store_with_db() -> (SqlitePool, SettingsStore) {
        let pool = init_memory_database().await.unwrap();
        let store = SettingsStore::init(pool.clone()).await.unwrap();
        (pool, store)
    }

    async fn insert_guest(pool: &SqlitePool, email: &str, pin: &str, active: bool) -> i64 {
        sqlx::query("INSERT INTO guests (email, pin, is_active) VALUES (?, ?, ?)")
            .bind(email)
            .bind(pin)
            .bind(active)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query_scalar("SELECT id FROM guests WHERE email = ?")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn generated_pins_are_eight_digits() {
        for _ in 0..100 {
            let pin = generate_pin();
            assert_eq!(pin.len(), 8);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn static_admin_pin_resolves_to_admin() {
        let (pool, store) = store_with_db().await;
        let cred = resolve_credential(&pool, &store, "12345678", "12345678")
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Admin);
        assert_eq!(cred.subject, "admin");
    }

    #[tokio::test]
    async fn override_shadows_static_pin() {
        let (pool, store) = store_with_db().await;
        store
            .update(SettingsUpdate {
                admin_pin: Some("55556666".into()),
                ..SettingsUpdate::default()
            })
            .await
            .unwrap();

        let cred = resolve_credential(&pool, &store, "12345678", "55556666")
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Admin);

        // The static PIN grants nothing while the override is set
        assert!(matches!(
            resolve_credential(&pool, &store, "12345678", "12345678").await,
            Err(Error::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn empty_override_falls_back_to_static_pin() {
        let (pool, store) = store_with_db().await;
        sqlx::query("UPDATE system_settings SET admin_pin = '' WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();
        store.refresh().await.unwrap();

        let cred = resolve_credential(&pool, &store, "12345678", "12345678")
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Admin);
    }

    #[tokio::test]
    async fn active_guest_resolves_by_pin() {
        let (pool, store) = store_with_db().await;
        let id = insert_guest(&pool, "g@example.com", "24681357", true).await;

        let cred = resolve_credential(&pool, &store, "12345678", "24681357")
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Guest);
        assert_eq!(cred.subject, id.to_string());
    }

    #[tokio::test]
    async fn inactive_guest_is_rejected() {
        let (pool, store) = store_with_db().await;
        insert_guest(&pool, "g@example.com", "24681357", false).await;

        assert!(matches!(
            resolve_credential(&pool, &store, "12345678", "24681357").await,
            Err(Error::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn unknown_pin_is_rejected() {
        let (pool, store) = store_with_db().await;
        assert!(matches!(
            resolve_credential(&pool, &store, "12345678", "00000001").await,
            Err(Error::InvalidCredential)
        ));
    }
}
