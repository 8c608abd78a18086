//! The structured log protocol spoken by pipeline programs on stderr.
//!
//! Each line is a JSON object `{"level": ..., "message": ...}`, or the same
//! object wrapped as `[{"error_msg": {...}}]`. Anything else is relayed as
//! an error with the raw line prefixed by `!`.

use crate::diagnostics::{Diagnostics, Severity};
use serde::Deserialize;
use serde_json::Value;

/// One message from a pipeline program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogRecord {
    pub level: String,
    pub message: Value,
}

impl LogRecord {
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.level)
    }

    /// Message text; non-string messages are shown as JSON.
    pub fn text(&self) -> String {
        match &self.message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Wrapped {
    error_msg: LogRecord,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Line {
    Bare(LogRecord),
    Wrapped(Vec<Wrapped>),
}

/// Parse one stderr line.
pub fn parse_line(line: &str) -> Option<Vec<LogRecord>> {
    match serde_json::from_str::<Line>(line).ok()? {
        Line::Bare(record) => Some(vec![record]),
        Line::Wrapped(items) => Some(items.into_iter().map(|w| w.error_msg).collect()),
    }
}

/// Relay everything a program wrote to stderr, attributed to `sender`.
pub fn relay(stderr: &str, sender: &str, diag: &Diagnostics) {
    for line in stderr.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some(records) => {
                for record in records {
                    diag.emit(record.severity(), sender, record.text());
                }
            }
            None => diag.emit(Severity::Error, sender, format!("!{}", line)),
        }
    }
}
