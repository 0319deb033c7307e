// src/models/event.rs

//! A single vale vista payment row and its semantic classification.

use std::fmt;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const DATE_LABEL: &str = "Fecha de Pago";
const MEDIUM_LABEL: &str = "Medio de Pago";
const OFFICE_LABEL: &str = "Oficina/Banco";
const STATUS_LABEL: &str = "Estado";

/// Semantic kind of a payment row, derived from its status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Already collected; history only.
    PaidRendered,
    /// Ready to collect at the office.
    ReadyToCollect,
    /// Will become collectable on the stated date.
    PendingRendition,
    /// Status phrasing we have not seen before.
    Unknown,
}

impl EventKind {
    /// Classify a free-text status from the bank table.
    ///
    /// Case-insensitive substring matching; the accented and plain
    /// spellings of "rendición" are both accepted.
    pub fn classify(status: &str) -> EventKind {
        let status = status.to_lowercase();
        if status.contains("pagado") && status.contains("rendido") {
            return EventKind::PaidRendered;
        }
        if status.contains("vigente") && status.contains("rendido") {
            return EventKind::ReadyToCollect;
        }
        if status.contains("vigente")
            && (status.contains("rendición") || status.contains("rendicion"))
        {
            return EventKind::PendingRendition;
        }
        error!("Unable to classify event status: {status}");
        EventKind::Unknown
    }

    /// Whether this kind is worth proactively telling a user about.
    ///
    /// Unknown counts as actionable: a new status phrasing must never
    /// be silently dropped from notifications.
    pub fn is_actionable(self) -> bool {
        !matches!(self, EventKind::PaidRendered)
    }
}

/// One row of the bank's payments table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    date: String,
    medium: String,
    office: String,
    status: String,
    kind: EventKind,
}

impl Event {
    /// Build an event from the four table cells, classifying the status.
    pub fn new(
        date: impl Into<String>,
        medium: impl Into<String>,
        office: impl Into<String>,
        status: impl Into<String>,
    ) -> Event {
        let status = status.into();
        let kind = EventKind::classify(&status);
        Event {
            date: date.into(),
            medium: medium.into(),
            office: office.into(),
            status,
            kind,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Canonical multi-line text form, also used for cache storage.
    pub fn to_block(&self) -> String {
        format!(
            "{DATE_LABEL}: {}\n{MEDIUM_LABEL}: {}\n{OFFICE_LABEL}: {}\n{STATUS_LABEL}: {}",
            self.date, self.medium, self.office, self.status
        )
    }

    /// Inverse of [`Event::to_block`].
    pub fn from_block(block: &str) -> Result<Event> {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() != 4 {
            error!("Expected 4 lines in cached event, got {}: {block}", lines.len());
            return Err(AppError::parse("malformed cached event block"));
        }
        let field = |line: &str, label: &str| -> Result<String> {
            line.strip_prefix(label)
                .and_then(|rest| rest.strip_prefix(": "))
                .map(str::to_owned)
                .ok_or_else(|| AppError::parse(format!("missing '{label}' in cached event")))
        };
        Ok(Event::new(
            field(lines[0], DATE_LABEL)?,
            field(lines[1], MEDIUM_LABEL)?,
            field(lines[2], OFFICE_LABEL)?,
            field(lines[3], STATUS_LABEL)?,
        ))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_block())
    }
}
