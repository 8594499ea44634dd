//! Structured logging for the prediction shell.

mod format;

pub use format::{LogEvent, StructuredLogger};
