//! Error types for panstyle.

use std::io;
use thiserror::Error;

/// Result type alias for panstyle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while resolving styles or running a pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fatal problem before the pipeline starts (engine missing or too old).
    #[error("setup error: {0}")]
    Setup(String),

    /// A metadata node lacks its tag/content pair, or the tree is unreadable.
    #[error("malformed document tree: {0}")]
    BadAst(String),

    /// A metadata field was looked up but is not present.
    #[error("field \"{0}\" not found")]
    MissingField(String),

    /// A metadata field holds a value of an unexpected type.
    #[error("value of \"{field}\": expecting type \"{expected}\", but found type \"{found}\"")]
    WrongType {
        field: String,
        expected: String,
        found: String,
    },

    /// Style definitions refer to each other in a loop.
    #[error("cyclic style definitions: {}", .0.join(" -> "))]
    StyleCycle(Vec<String>),

    /// An external program could not be launched.
    #[error("failed to run \"{program}\": {source}")]
    Process {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The conversion engine ran but did not produce usable output.
    #[error("conversion engine failed: {0}")]
    Engine(String),

    /// Strict mode is on and an error was reported.
    #[error("strict mode: {0} error(s) reported, aborting")]
    Strict(usize),

    /// A component was invoked in a way that violates its own contract.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error happened before the pipeline could start.
    pub fn is_setup(&self) -> bool {
        matches!(self, Error::Setup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingField("style".into());
        assert_eq!(err.to_string(), "field \"style\" not found");

        let err = Error::WrongType {
            field: "filter".into(),
            expected: "MetaList".into(),
            found: "MetaBool".into(),
        };
        assert_eq!(
            err.to_string(),
            "value of \"filter\": expecting type \"MetaList\", but found type \"MetaBool\""
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::StyleCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "cyclic style definitions: a -> b -> a");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_setup());
    }
}
