/*!
 * Observability sink for the translation engine.
 *
 * The orchestrator reports what happens to each chunk through a
 * `TranslationObserver` handed to it by the caller instead of writing to a
 * process-wide logger. `LogObserver` forwards events to the `log` facade,
 * `CapturingObserver` keeps them in memory for inspection.
 */

use log::{debug, info, warn, Level};
use std::sync::{Arc, Mutex};

/// Event names emitted by the engine.
///
/// Per-line events carry `index`, the zero-based line index, and `number`, the block
/// number as written by the backend.
pub mod events {
    pub const PHASE_STARTED: &str = "phase_started";
    pub const CHUNK_SENT: &str = "chunk_sent";
    pub const CHUNK_RECONCILED: &str = "chunk_reconciled";
    pub const BACKEND_UNAVAILABLE: &str = "backend_unavailable";
    pub const STRAY_BLOCK: &str = "stray_block";
    pub const SKIPPED_LINE: &str = "skipped_line";
    pub const INSTRUCTION_BLOCK: &str = "instruction_block";
    pub const UNNUMBERED_BLOCK: &str = "unnumbered_block";
    pub const OUTPUT_TRUNCATED: &str = "output_truncated";
    pub const MALFORMED_BLOCK: &str = "malformed_block";
    pub const ROUND_FINISHED: &str = "round_finished";
    pub const RETRIES_EXHAUSTED: &str = "retries_exhausted";
    pub const TRANSLATION_FINISHED: &str = "translation_finished";
}

/// Receiver of engine events
pub trait TranslationObserver: Send + Sync {
    /// Record a named event with its key/value fields
    fn record(&self, event: &str, fields: &[(&str, String)]);
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TranslationObserver for NullObserver {
    fn record(&self, _event: &str, _fields: &[(&str, String)]) {}
}

/// Observer that writes events through the `log` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LogObserver {
    fn level_for(event: &str) -> Level {
        match event {
            events::BACKEND_UNAVAILABLE
            | events::STRAY_BLOCK
            | events::SKIPPED_LINE
            | events::INSTRUCTION_BLOCK
            | events::UNNUMBERED_BLOCK
            | events::OUTPUT_TRUNCATED
            | events::MALFORMED_BLOCK
            | events::RETRIES_EXHAUSTED => Level::Warn,
            events::PHASE_STARTED | events::ROUND_FINISHED | events::TRANSLATION_FINISHED => Level::Info,
            _ => Level::Debug,
        }
    }
}

impl TranslationObserver for LogObserver {
    fn record(&self, event: &str, fields: &[(&str, String)]) {
        let rendered = format_fields(fields);
        match Self::level_for(event) {
            Level::Warn => warn!("{} {}", event, rendered),
            Level::Info => info!("{} {}", event, rendered),
            _ => debug!("{} {}", event, rendered),
        }
    }
}

/// A recorded event
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEvent {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl ObservedEvent {
    /// Value of a field, if present
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Observer that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct CapturingObserver {
    entries: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl CapturingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.entries.lock().map(|entries| entries.clone()).unwrap_or_default()
    }

    /// Events with the given name
    pub fn named(&self, name: &str) -> Vec<ObservedEvent> {
        self.events().into_iter().filter(|e| e.name == name).collect()
    }
}

impl TranslationObserver for CapturingObserver {
    fn record(&self, event: &str, fields: &[(&str, String)]) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(ObservedEvent {
                name: event.to_string(),
                fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            });
        }
    }
}

/// Render fields as `key=value` pairs
pub fn format_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}
