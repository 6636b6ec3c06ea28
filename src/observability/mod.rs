//! Observability for the orchestrator
//!
//! Structured JSON log lines on stdout, keyed by typed lifecycle events.
//!
//! ```ignore
//! use mysqld_orchestrator::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::InitStateDetected, &[("state", "pristine")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::Severity;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    logger::emit(event.severity(), event.as_str(), fields);
}
