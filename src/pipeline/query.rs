// src/pipeline/query.rs

//! One query against the bank for a (user, RUT) pair.

use chrono::Duration;
use log::{debug, warn};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{ResultKind, Rut, WebResult};
use crate::services::parser;
use crate::services::retriever::PageRetriever;
use crate::storage::{CacheRepo, UserRepo};

/// Outcome of a query: the text to show plus the change-detection state
/// that decides whether it is worth a proactive notification.
#[derive(Debug)]
pub struct QueryOutcome {
    text: String,
    result: WebResult,
    changed: bool,
    from_cache: bool,
}

impl QueryOutcome {
    /// Text to show the user unconditionally.
    pub fn display_text(&self) -> &str {
        &self.text
    }

    pub fn result(&self) -> &WebResult {
        &self.result
    }

    /// Whether the result was served from a fresh cache row.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Whether the cache reported a change on this query.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Whether this outcome is worth proactively telling the user.
    ///
    /// All must hold: normal classification, non-empty text, the cache
    /// saw a change, at least one event, at least one actionable event.
    /// A user who already saw this exact result is never re-notified.
    pub fn is_notable(&self) -> bool {
        self.result.kind() == ResultKind::NoError
            && !self.text.is_empty()
            && self.changed
            && !self.result.events().is_empty()
            && self.result.any_actionable()
    }
}

/// Query the bank for `rut` on behalf of `platform_id`.
///
/// Serves from the cache when a row younger than `cache_expiry` exists;
/// otherwise retrieves and parses the live page and updates the cache.
/// Error classifications are cached too (as their public message) so
/// repeated queries against a restricted or failing RUT are also
/// rate-limited. Retriever and parser failures propagate.
pub async fn run_query(
    pool: &SqlitePool,
    retriever: &dyn PageRetriever,
    rut: &Rut,
    platform_id: i64,
    cache_expiry: Duration,
) -> Result<QueryOutcome> {
    let user_id = UserRepo::get_or_create(pool, platform_id).await?;

    if let Some(text) = CacheRepo::get(pool, user_id, rut, cache_expiry).await? {
        debug!("Serving {rut} from cache for user {user_id}");
        let result = WebResult::from_cache_text(&text)?;
        return Ok(QueryOutcome {
            text,
            result,
            changed: false,
            from_cache: true,
        });
    }

    let raw_page = retriever.retrieve(rut).await?;
    let result = parser::parse(&raw_page)?;
    let text = result.to_cache_text();

    // Best effort: a failed write must not withhold the fresh result
    // from the user who asked, but without a recorded baseline the
    // change flag stays down so no proactive notification fires.
    let changed = match CacheRepo::update(pool, user_id, rut, &text).await {
        Ok(changed) => changed,
        Err(error) => {
            warn!("Unable to update the cache: {error}");
            false
        }
    };

    Ok(QueryOutcome {
        text,
        result,
        changed,
        from_cache: false,
    })
}
