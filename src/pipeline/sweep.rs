// src/pipeline/sweep.rs

//! Proactive notification sweep over subscribed users.
//!
//! Each tick refreshes **one** overdue subscriber, picked uniformly at
//! random. Spreading refreshes over ticks is a self-imposed rate limit
//! against the bank, not a correctness requirement.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use log::{debug, info, warn};
use rand::Rng;
use sqlx::SqlitePool;

use crate::config::{Config, SweepConfig};
use crate::error::{AppError, Result};
use crate::models::Rut;
use crate::pipeline::query::run_query;
use crate::services::retriever::PageRetriever;
use crate::storage::UserRepo;

/// Delivery channel for proactive notifications. Implemented by the
/// external chat adapter; [`LogNotifier`] is the built-in stand-in.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `chat_id`.
    ///
    /// Must return [`AppError::Unauthorized`] when the platform reports
    /// the user blocked deliveries, so the sweep can unsubscribe them.
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Notifier that only logs. Used by the CLI where no chat platform is
/// attached.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()> {
        info!("Notify chat {chat_id}:\n{text}");
        Ok(())
    }
}

/// Run one sweep tick. Returns whether a subscriber was processed.
///
/// Query failures are logged and swallowed: a broken upstream must not
/// kill the loop, and proactive delivery never surfaces errors to
/// users.
pub async fn run_sweep_tick(
    pool: &SqlitePool,
    retriever: &dyn PageRetriever,
    notifier: &dyn Notifier,
    config: &Config,
) -> Result<bool> {
    let due = UserRepo::due_for_refresh(pool, config.sweep.refresh_horizon()).await?;
    if due.is_empty() {
        debug!("No subscribers due for refresh");
        return Ok(false);
    }

    let pick = &due[rand::rng().random_range(0..due.len())];
    debug!(
        "Due queue length: {}. Updating user_id={}",
        due.len(),
        pick.user_id
    );

    let Some(rut) = Rut::from_body_number(pick.rut) else {
        warn!("Stored rut {} for user {} is invalid", pick.rut, pick.user_id);
        return Ok(true);
    };

    let outcome = match run_query(
        pool,
        retriever,
        &rut,
        pick.platform_id,
        config.cache.expiry(),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!("Sweep query for user {} failed: {error}", pick.user_id);
            return Ok(true);
        }
    };

    if !outcome.is_notable() {
        return Ok(true);
    }

    match notifier.notify(pick.chat_id, outcome.display_text()).await {
        Ok(()) => info!("Notified user {} about new results", pick.user_id),
        Err(AppError::Unauthorized) => {
            info!(
                "Chat {} rejected delivery, unsubscribing user {}",
                pick.chat_id, pick.user_id
            );
            UserRepo::unsubscribe(pool, pick.platform_id, pick.chat_id).await?;
        }
        Err(error) => warn!("Delivery to chat {} failed: {error}", pick.chat_id),
    }
    Ok(true)
}

/// Whether `now` falls inside the notification window: weekdays from
/// 10:00 local time, local time taken from the configured UTC offset.
pub fn in_notification_window(now: DateTime<Utc>, config: &SweepConfig) -> bool {
    let offset = FixedOffset::east_opt(config.window_utc_offset * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    let local = now.with_timezone(&offset);
    local.weekday().number_from_monday() <= 5 && local.hour() >= 10
}

/// Run sweep ticks until ctrl-c, sleeping a random interval between
/// them. Ticks outside the notification window are skipped.
pub async fn run_watch_loop(
    pool: &SqlitePool,
    retriever: &dyn PageRetriever,
    notifier: &dyn Notifier,
    config: &Config,
) -> Result<()> {
    info!("Watch loop started");
    loop {
        let wait = {
            let mut rng = rand::rng();
            Duration::seconds(rng.random_range(
                config.sweep.min_interval_secs()..=config.sweep.max_interval_secs(),
            ))
        };
        debug!("Sleeping {}s until the next tick", wait.num_seconds());

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
            _ = tokio::time::sleep(wait.to_std().unwrap_or_default()) => {}
        }

        if !in_notification_window(Utc::now(), &config.sweep) {
            debug!("Outside the notification window, skipping tick");
            continue;
        }
        if let Err(error) = run_sweep_tick(pool, retriever, notifier, config).await {
            warn!("Sweep tick failed: {error}");
        }
    }
}
