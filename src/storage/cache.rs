// src/storage/cache.rs

//! Per-(user, RUT) cache of the last serialized result.
//!
//! The boolean returned by [`CacheRepo::update`] is the only change
//! signal in the system: the whole notification policy hangs on it.

use chrono::{DateTime, Duration, Utc};
use log::warn;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Rut;

/// Access to the cached_results table.
pub struct CacheRepo;

impl CacheRepo {
    /// Return the stored text if it is younger than `expiry`.
    ///
    /// A stale row is a cache miss, not "no data".
    pub async fn get(
        pool: &SqlitePool,
        user_id: i64,
        rut: &Rut,
        expiry: Duration,
    ) -> Result<Option<String>> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT result, retrieved FROM cached_results WHERE user_id = ? AND rut = ?",
        )
        .bind(user_id)
        .bind(i64::from(rut.body()))
        .fetch_optional(pool)
        .await?;

        Ok(row.and_then(|(text, retrieved)| {
            if Utc::now() - retrieved < expiry {
                Some(text)
            } else {
                None
            }
        }))
    }

    /// Store `text` for (user, rut), returning whether it differs from
    /// what was stored before.
    ///
    /// The timestamp is always refreshed; the text is only replaced
    /// when it changed. A first insert counts as changed.
    pub async fn update(pool: &SqlitePool, user_id: i64, rut: &Rut, text: &str) -> Result<bool> {
        let rut_body = i64::from(rut.body());
        let existing: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, result FROM cached_results WHERE user_id = ? AND rut = ?")
                .bind(user_id)
                .bind(rut_body)
                .fetch_all(pool)
                .await?;

        let now = Utc::now();
        let Some((row_id, stored)) = existing.first() else {
            sqlx::query(
                "INSERT INTO cached_results (user_id, rut, retrieved, result)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(rut_body)
            .bind(now)
            .bind(text)
            .execute(pool)
            .await?;
            return Ok(true);
        };
        if existing.len() > 1 {
            warn!("Unexpected cached_results row count: {}", existing.len());
        }

        let changed = stored.as_str() != text;
        if changed {
            sqlx::query("UPDATE cached_results SET result = ?, retrieved = ? WHERE id = ?")
                .bind(text)
                .bind(now)
                .bind(row_id)
                .execute(pool)
                .await?;
        } else {
            sqlx::query("UPDATE cached_results SET retrieved = ? WHERE id = ?")
                .bind(now)
                .bind(row_id)
                .execute(pool)
                .await?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{UserRepo, test_pool};

    async fn setup() -> (SqlitePool, i64, Rut) {
        let pool = test_pool().await;
        let user_id = UserRepo::get_or_create(&pool, 100).await.unwrap();
        let rut = Rut::parse("12.345.678-5").unwrap();
        (pool, user_id, rut)
    }

    #[tokio::test]
    async fn test_update_change_detection_sequence() {
        let (pool, user_id, rut) = setup().await;

        assert!(CacheRepo::update(&pool, user_id, &rut, "X").await.unwrap());
        assert!(!CacheRepo::update(&pool, user_id, &rut, "X").await.unwrap());
        assert!(CacheRepo::update(&pool, user_id, &rut, "Y").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_fresh_and_stale() {
        let (pool, user_id, rut) = setup().await;
        CacheRepo::update(&pool, user_id, &rut, "payload")
            .await
            .unwrap();

        let fresh = CacheRepo::get(&pool, user_id, &rut, Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(fresh.as_deref(), Some("payload"));

        // Zero expiry turns every row stale.
        let stale = CacheRepo::get(&pool, user_id, &rut, Duration::zero())
            .await
            .unwrap();
        assert_eq!(stale, None);
    }

    #[tokio::test]
    async fn test_get_missing_row() {
        let (pool, user_id, rut) = setup().await;
        let missing = CacheRepo::get(&pool, user_id, &rut, Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_rows_are_keyed_per_user_and_rut() {
        let (pool, user_id, rut) = setup().await;
        let other_user = UserRepo::get_or_create(&pool, 200).await.unwrap();
        let other_rut = Rut::parse("7.654.321-6").unwrap();

        assert!(CacheRepo::update(&pool, user_id, &rut, "A").await.unwrap());
        assert!(
            CacheRepo::update(&pool, other_user, &rut, "A")
                .await
                .unwrap()
        );
        assert!(
            CacheRepo::update(&pool, user_id, &other_rut, "A")
                .await
                .unwrap()
        );

        // Each key keeps its own row.
        assert!(!CacheRepo::update(&pool, user_id, &rut, "A").await.unwrap());
    }
}
