// src/config.rs

//! Application configuration structures and loading.

use std::fs;
use std::path::Path;

use chrono::Duration;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Background sweep settings
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.cache.expiry_hours <= 0 {
            return Err(AppError::config("cache.expiry_hours must be > 0"));
        }
        if self.sweep.refresh_hours <= 0 {
            return Err(AppError::config("sweep.refresh_hours must be > 0"));
        }
        if self.sweep.min_interval_mins > self.sweep.max_interval_mins {
            return Err(AppError::config(
                "sweep.min_interval_mins must be <= sweep.max_interval_mins",
            ));
        }
        if !(-12..=14).contains(&self.sweep.window_utc_offset) {
            return Err(AppError::config(
                "sweep.window_utc_offset must be between -12 and 14",
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(AppError::config("database.url is empty"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for requests to the bank
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Hours before a cached result goes stale
    #[serde(default = "defaults::cache_expiry")]
    pub expiry_hours: i64,
}

impl CacheConfig {
    pub fn expiry(&self) -> Duration {
        Duration::hours(self.expiry_hours)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_hours: defaults::cache_expiry(),
        }
    }
}

/// Background sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Hours before a subscriber's cached result is due for a refresh
    #[serde(default = "defaults::refresh_hours")]
    pub refresh_hours: i64,

    /// Minimum minutes between sweep ticks
    #[serde(default = "defaults::min_interval")]
    pub min_interval_mins: i64,

    /// Maximum minutes between sweep ticks
    #[serde(default = "defaults::max_interval")]
    pub max_interval_mins: i64,

    /// UTC offset in hours used to evaluate the notification window
    #[serde(default = "defaults::window_utc_offset")]
    pub window_utc_offset: i32,
}

impl SweepConfig {
    pub fn refresh_horizon(&self) -> Duration {
        Duration::hours(self.refresh_hours)
    }

    pub fn min_interval_secs(&self) -> i64 {
        self.min_interval_mins * 60
    }

    pub fn max_interval_secs(&self) -> i64 {
        self.max_interval_mins * 60
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            refresh_hours: defaults::refresh_hours(),
            min_interval_mins: defaults::min_interval(),
            max_interval_mins: defaults::max_interval(),
            window_utc_offset: defaults::window_utc_offset(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    #[serde(default = "defaults::database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::database_url(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0 Safari/537.36"
            .to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn cache_expiry() -> i64 {
        2
    }

    pub fn refresh_hours() -> i64 {
        33
    }

    pub fn min_interval() -> i64 {
        5
    }

    pub fn max_interval() -> i64 {
        25
    }

    pub fn window_utc_offset() -> i32 {
        -4
    }

    pub fn database_url() -> String {
        "sqlite://valevista.db?mode=rwc".to_string()
    }
}
