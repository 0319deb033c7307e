// src/error.rs

//! Unified error handling for the watcher.

use thiserror::Error;

use crate::messages;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Every variant maps to a public, user-safe message via
/// [`AppError::public_message`]; internal detail stays in the variant
/// payload and only reaches the logs.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream request failed (transport error or non-success status)
    #[error("connection error: {0}")]
    Connection(String),

    /// The bank page had an unrecognized shape
    #[error("parse error: {0}")]
    Parse(String),

    /// CSS selector parsing failed
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The user asked for an invalid operation; the payload is the
    /// message to send back
    #[error("bad use: {0}")]
    BadUse(&'static str),

    /// The platform rejected a delivery (user blocked the bot)
    #[error("delivery rejected by the platform")]
    Unauthorized,
}

impl AppError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Message safe to show to the end user.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Connection(_) => messages::CONNECTION_ERROR,
            Self::Parse(_) | Self::Selector { .. } => messages::PARSER_ERROR,
            Self::BadUse(message) => message,
            _ => messages::INTERNAL_ERROR,
        }
    }
}
