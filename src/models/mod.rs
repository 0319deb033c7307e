// src/models/mod.rs

//! Domain models for the watcher.

mod event;
mod result;
mod rut;

// Re-export all public types
pub use event::{Event, EventKind};
pub use result::{ResultKind, WebResult};
pub use rut::Rut;
