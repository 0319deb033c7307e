// src/storage/users.rs

//! Users, stored RUTs, and subscriptions.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::messages;
use crate::models::Rut;

/// A subscribed user whose cached result is due for a refresh.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DueSubscriber {
    pub user_id: i64,
    pub platform_id: i64,
    pub rut: i64,
    pub chat_id: i64,
}

/// Access to the users and subscriptions tables.
pub struct UserRepo;

impl UserRepo {
    /// Internal id for a platform user, creating the row on first sight.
    pub async fn get_or_create(pool: &SqlitePool, platform_id: i64) -> Result<i64> {
        if let Some((id,)) = Self::find(pool, platform_id).await? {
            return Ok(id);
        }
        let result = sqlx::query("INSERT INTO users (platform_id) VALUES (?)")
            .bind(platform_id)
            .execute(pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find(pool: &SqlitePool, platform_id: i64) -> Result<Option<(i64,)>> {
        Ok(
            sqlx::query_as("SELECT id FROM users WHERE platform_id = ?")
                .bind(platform_id)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// Store the user's RUT (bare body, check digit recomputed on read).
    pub async fn set_rut(pool: &SqlitePool, platform_id: i64, rut: &Rut) -> Result<()> {
        let user_id = Self::get_or_create(pool, platform_id).await?;
        sqlx::query("UPDATE users SET rut = ? WHERE id = ?")
            .bind(i64::from(rut.body()))
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// The user's stored RUT, if any.
    pub async fn get_rut(pool: &SqlitePool, platform_id: i64) -> Result<Option<Rut>> {
        let row: Option<(Option<i64>,)> = sqlx::query_as(
            "SELECT rut FROM users WHERE platform_id = ?",
        )
        .bind(platform_id)
        .fetch_optional(pool)
        .await?;
        Ok(row
            .and_then(|(body,)| body)
            .and_then(Rut::from_body_number))
    }

    /// Subscribe a user for proactive notifications on `chat_id`.
    ///
    /// Requires a stored RUT; duplicate subscriptions are a user error.
    pub async fn subscribe(pool: &SqlitePool, platform_id: i64, chat_id: i64) -> Result<()> {
        if Self::get_rut(pool, platform_id).await?.is_none() {
            return Err(AppError::BadUse(messages::SUBSCRIBE_NEEDS_RUT));
        }
        if Self::is_subscribed(pool, platform_id, chat_id).await? {
            return Err(AppError::BadUse(messages::ALREADY_SUBSCRIBED));
        }
        let user_id = Self::get_or_create(pool, platform_id).await?;
        sqlx::query("INSERT INTO subscriptions (user_id, chat_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(chat_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove a subscription.
    pub async fn unsubscribe(pool: &SqlitePool, platform_id: i64, chat_id: i64) -> Result<()> {
        let user_id = Self::get_or_create(pool, platform_id).await?;
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND chat_id = ?")
            .bind(user_id)
            .bind(chat_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::BadUse(messages::NOT_SUBSCRIBED));
        }
        Ok(())
    }

    /// Whether the user is subscribed with this chat.
    pub async fn is_subscribed(pool: &SqlitePool, platform_id: i64, chat_id: i64) -> Result<bool> {
        let user_id = Self::get_or_create(pool, platform_id).await?;
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM subscriptions WHERE user_id = ? AND chat_id = ?",
        )
        .bind(user_id)
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.is_some())
    }

    /// Chat id of a subscribed user, if any.
    pub async fn chat_id_of(pool: &SqlitePool, user_id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT chat_id FROM subscriptions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(chat_id,)| chat_id))
    }

    /// Subscribed users with a stored RUT whose cache row is absent or
    /// older than `older_than`.
    pub async fn due_for_refresh(
        pool: &SqlitePool,
        older_than: Duration,
    ) -> Result<Vec<DueSubscriber>> {
        let cutoff = Utc::now() - older_than;
        let due = sqlx::query_as::<_, DueSubscriber>(
            "SELECT u.id AS user_id, u.platform_id, u.rut, s.chat_id
             FROM users u
             JOIN subscriptions s ON s.user_id = u.id
             WHERE u.rut IS NOT NULL
               AND u.id NOT IN (
                   SELECT c.user_id FROM cached_results c WHERE c.retrieved > ?
               )",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;
        Ok(due)
    }
}
