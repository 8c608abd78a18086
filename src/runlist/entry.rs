//! Run-list entries and their lifecycle.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A stage of the pipeline. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preflight,
    Filter,
    Postprocess,
    Postflight,
    Cleanup,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::Preflight,
        Phase::Filter,
        Phase::Postprocess,
        Phase::Postflight,
        Phase::Cleanup,
    ];

    /// Metadata field (and support subdirectory) for this phase.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Preflight => "preflight",
            Phase::Filter => "filter",
            Phase::Postprocess => "postprocess",
            Phase::Postflight => "postflight",
            Phase::Cleanup => "cleanup",
        }
    }

    /// Whether entries of this phase receive the control message rather than
    /// piped document data.
    pub fn is_script(self) -> bool {
        matches!(self, Phase::Preflight | Phase::Postflight | Phase::Cleanup)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Queued,
    Running,
    Done,
    Failed,
}

impl Status {
    fn can_become(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Queued, Status::Running)
                | (Status::Running, Status::Done)
                | (Status::Running, Status::Failed)
        )
    }
}

/// One command of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunListEntry {
    /// Phase the command runs in
    pub kind: Phase,

    /// Resolved path, or a bare name looked up on `PATH`
    pub command: String,

    /// Arguments passed after the command
    pub arguments: Vec<String>,

    #[serde(default)]
    status: Status,
}

/// The whole pipeline, in phase order.
pub type RunList = Vec<RunListEntry>;

impl RunListEntry {
    /// Create a queued entry with no arguments.
    pub fn new(kind: Phase, command: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.into(),
            arguments: Vec::new(),
            status: Status::Queued,
        }
    }

    /// Set the arguments.
    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `next`. Status only moves forward, and only once per step.
    pub fn advance(&mut self, next: Status) -> Result<()> {
        if !self.status.can_become(next) {
            return Err(Error::Internal(format!(
                "run-list entry \"{}\" cannot go from {:?} to {:?}",
                self.command, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Command and arguments joined for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name diagnostics from this command are attributed to.
    pub fn sender(&self) -> String {
        Path::new(&self.command)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.command.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_and_names() {
        let names: Vec<_> = Phase::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["preflight", "filter", "postprocess", "postflight", "cleanup"]
        );
        assert!(Phase::Cleanup.is_script());
        assert!(!Phase::Filter.is_script());
        assert!(!Phase::Postprocess.is_script());
    }

    #[test]
    fn test_status_is_monotonic() {
        let mut entry = RunListEntry::new(Phase::Filter, "f");
        assert_eq!(entry.status(), Status::Queued);
        assert!(entry.advance(Status::Done).is_err());
        entry.advance(Status::Running).unwrap();
        entry.advance(Status::Failed).unwrap();
        assert!(entry.advance(Status::Done).is_err());
        assert!(entry.advance(Status::Running).is_err());
        assert_eq!(entry.status(), Status::Failed);
    }

    #[test]
    fn test_sender_and_command_line() {
        let entry = RunListEntry::new(Phase::Postflight, "/s/postflight/latexmk/latexmk.py")
            .with_arguments(vec!["--quiet".into()]);
        assert_eq!(entry.sender(), "latexmk");
        assert_eq!(entry.command_line(), "/s/postflight/latexmk/latexmk.py --quiet");
    }

    #[test]
    fn test_serialized_shape() {
        let entry = RunListEntry::new(Phase::Filter, "f").with_arguments(vec!["html".into()]);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "filter",
                "command": "f",
                "arguments": ["html"],
                "status": "queued"
            })
        );
    }
}
