// src/lib.rs

//! Vale vista watcher library.
//!
//! Queries the Banco de Chile public payment form for vale vista status,
//! caches results per (user, RUT) pair, and decides which freshly
//! retrieved results are worth pushing to subscribed users. The chat
//! platform adapter lives outside this crate; it consumes the pipeline
//! and storage APIs exposed here.

pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
