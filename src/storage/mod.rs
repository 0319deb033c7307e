// src/storage/mod.rs

//! SQLite-backed persistence: users, subscriptions, and the per-(user,
//! RUT) result cache.
//!
//! Repositories are plain structs with async methods taking a pool
//! reference; callers thread the pool explicitly instead of touching a
//! process-wide connection.

pub mod cache;
pub mod users;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Result;

// Re-export for convenience
pub use cache::CacheRepo;
pub use users::{DueSubscriber, UserRepo};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform_id INTEGER NOT NULL UNIQUE,
        rut INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS cached_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        rut INTEGER NOT NULL,
        retrieved TEXT NOT NULL,
        result TEXT NOT NULL,
        UNIQUE(user_id, rut)
    )",
    "CREATE TABLE IF NOT EXISTS subscriptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
        chat_id INTEGER NOT NULL UNIQUE
    )",
];

/// Connect to the database and ensure the schema exists.
///
/// SQLite allows a single writer at a time; one pooled connection keeps
/// writes serialized per key without SQLITE_BUSY churn, and also makes
/// `sqlite::memory:` URLs behave (every pooled connection would
/// otherwise open its own empty in-memory database).
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}
