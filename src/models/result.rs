// src/models/result.rs

//! Parsed outcome of one query against the bank page.

use crate::error::Result;
use crate::messages;
use crate::models::Event;

/// Classification of a parsed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// The page answered normally (possibly with zero payments).
    NoError,
    /// The public form refuses to answer for bank clients.
    ClientRestricted,
    /// The bank asked to retry later.
    RetryLater,
}

/// A parsed response from the bank page.
///
/// Invariant: only `NoError` results carry events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebResult {
    kind: ResultKind,
    events: Vec<Event>,
}

impl WebResult {
    /// Build an error-classified result (no events).
    pub fn error(kind: ResultKind) -> WebResult {
        WebResult {
            kind,
            events: Vec::new(),
        }
    }

    /// Build a normal result with the given events.
    pub fn with_events(events: Vec<Event>) -> WebResult {
        WebResult {
            kind: ResultKind::NoError,
            events,
        }
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Whether any event is worth proactively surfacing.
    pub fn any_actionable(&self) -> bool {
        self.events.iter().any(|e| e.kind().is_actionable())
    }

    /// Public message for error classifications, `None` for `NoError`.
    pub fn error_text(&self) -> Option<&'static str> {
        match self.kind {
            ResultKind::ClientRestricted => Some(messages::CLIENT_RESTRICTED),
            ResultKind::RetryLater => Some(messages::RETRY_LATER),
            ResultKind::NoError => None,
        }
    }

    /// Serialize to the canonical cache text.
    ///
    /// Error results store their public message, normal results store
    /// blank-line-joined event blocks, and an empty normal result
    /// stores the fixed no-payments sentinel. The cache compares this
    /// text byte-for-byte for change detection, so the rendering must
    /// stay stable.
    pub fn to_cache_text(&self) -> String {
        if let Some(error) = self.error_text() {
            return error.to_owned();
        }
        if self.events.is_empty() {
            return messages::NO_PAYMENTS.to_owned();
        }
        self.events
            .iter()
            .map(Event::to_block)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Rebuild a result from cached text. Inverse of [`Self::to_cache_text`].
    pub fn from_cache_text(text: &str) -> Result<WebResult> {
        if text.contains(messages::CLIENT_RESTRICTED) {
            return Ok(WebResult::error(ResultKind::ClientRestricted));
        }
        if text.contains(messages::RETRY_LATER) {
            return Ok(WebResult::error(ResultKind::RetryLater));
        }
        if text.contains(messages::NO_PAYMENTS) {
            return Ok(WebResult::with_events(Vec::new()));
        }
        let events = text
            .split("\n\n")
            .map(Event::from_block)
            .collect::<Result<Vec<_>>>()?;
        Ok(WebResult::with_events(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events(count: usize) -> Vec<Event> {
        (0..count)
            .map(|i| {
                Event::new(
                    format!("0{}/08/2026", i + 1),
                    "Vale Vista Virtual",
                    "Oficina Central",
                    if i % 2 == 0 {
                        "Vigente / Rendido"
                    } else {
                        "Pagado / Rendido"
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_cache_text_round_trip() {
        for count in 1..=5 {
            let result = WebResult::with_events(sample_events(count));
            let rebuilt = WebResult::from_cache_text(&result.to_cache_text()).unwrap();
            assert_eq!(result, rebuilt);
        }
    }

    #[test]
    fn test_error_kinds_round_trip() {
        for kind in [ResultKind::ClientRestricted, ResultKind::RetryLater] {
            let result = WebResult::error(kind);
            let text = result.to_cache_text();
            assert_eq!(text, result.error_text().unwrap());
            let rebuilt = WebResult::from_cache_text(&text).unwrap();
            assert_eq!(rebuilt.kind(), kind);
            assert!(rebuilt.events().is_empty());
        }
    }

    #[test]
    fn test_empty_result_serializes_to_sentinel() {
        let result = WebResult::with_events(Vec::new());
        assert_eq!(result.to_cache_text(), crate::messages::NO_PAYMENTS);
        let rebuilt = WebResult::from_cache_text(&result.to_cache_text()).unwrap();
        assert_eq!(rebuilt.kind(), ResultKind::NoError);
        assert!(rebuilt.events().is_empty());
    }

    #[test]
    fn test_any_actionable() {
        let paid_only = WebResult::with_events(vec![Event::new(
            "01/08/2026",
            "Vale Vista",
            "Oficina",
            "Pagado / Rendido",
        )]);
        assert!(!paid_only.any_actionable());

        let mixed = WebResult::with_events(sample_events(2));
        assert!(mixed.any_actionable());
    }

    #[test]
    fn test_from_cache_text_rejects_garbage() {
        assert!(WebResult::from_cache_text("not an event block").is_err());
    }
}
