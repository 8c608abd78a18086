//! Diagnostics sink shared by every stage of the pipeline.
//!
//! Messages are forwarded to the [`log`] facade with the sender's name as the
//! log target, so output from an external script is attributed to that script.
//! The sink also counts errors; strict mode, set in
//! [`GeneralOptions`](crate::options::GeneralOptions), keys on that count.

use crate::error::{Error, Result};
use log::Level;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Sender name used for messages that originate in panstyle itself.
pub const SENDER: &str = "panstyle";

/// Severity of a diagnostic, matching the levels scripts may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Parse a level name. Unknown names are treated as errors.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" | "FATAL" => Severity::Critical,
            "ERROR" => Severity::Error,
            "WARNING" | "WARN" => Severity::Warning,
            "INFO" => Severity::Info,
            "DEBUG" | "NOTSET" => Severity::Debug,
            _ => Severity::Error,
        }
    }

    /// Whether this severity counts as an error.
    pub fn is_error(self) -> bool {
        self >= Severity::Error
    }

    fn log_level(self) -> Level {
        match self {
            Severity::Critical | Severity::Error => Level::Error,
            Severity::Warning => Level::Warn,
            Severity::Info => Level::Info,
            Severity::Debug => Level::Debug,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Collects diagnostics for one run.
///
/// The pipeline is single-threaded, so the counters are plain cells.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Cell<usize>,
    warnings: Cell<usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a message on behalf of `sender`.
    pub fn emit(&self, severity: Severity, sender: &str, message: impl fmt::Display) {
        if severity.is_error() {
            self.errors.set(self.errors.get() + 1);
        } else if severity == Severity::Warning {
            self.warnings.set(self.warnings.get() + 1);
        }
        let level = severity.log_level();
        if severity == Severity::Critical {
            log::log!(target: sender, level, "fatal: {}", message);
        } else {
            log::log!(target: sender, level, "{}", message);
        }
    }

    pub fn critical(&self, message: impl fmt::Display) {
        self.emit(Severity::Critical, SENDER, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, SENDER, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Severity::Warning, SENDER, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Severity::Info, SENDER, message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Severity::Debug, SENDER, message);
    }

    /// Number of ERROR-or-above messages reported so far.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.warnings.get()
    }

    /// Fail with [`Error::Strict`] if `strict` is set and an error was reported.
    pub fn check_strict(&self, strict: bool) -> Result<()> {
        let errors = self.error_count();
        if strict && errors > 0 {
            return Err(Error::Strict(errors));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("warning"), Severity::Warning);
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse("debug"), Severity::Debug);
        assert_eq!(Severity::parse("chatty"), Severity::Error);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical.is_error());
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(Severity::Info < Severity::Warning);
    }

    #[test]
    fn test_counts() {
        let diag = Diagnostics::new();
        diag.info("hello");
        diag.warn("careful");
        diag.error("broken");
        diag.emit(Severity::Critical, "script", "very broken");
        assert_eq!(diag.error_count(), 2);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_strict_mode() {
        let diag = Diagnostics::new();
        assert!(diag.check_strict(true).is_ok());
        diag.warn("not yet");
        assert!(diag.check_strict(true).is_ok());
        diag.error("now");
        assert!(diag.check_strict(false).is_ok());
        assert!(matches!(diag.check_strict(true), Err(Error::Strict(1))));
    }
}
