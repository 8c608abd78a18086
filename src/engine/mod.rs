//! The external conversion engine.
//!
//! The pipeline only needs four things from an engine: a version check,
//! turning input files into a document tree, turning YAML into metadata, and
//! rendering a tree into the target format. [`Pandoc`] drives the real
//! `pandoc` binary; tests substitute their own implementation.

mod pandoc;

pub use pandoc::{parse_version, Pandoc, MINIMUM_VERSION};

use crate::ast::Ast;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::meta::MetaMap;
use crate::options::EngineOptions;

/// A document conversion engine.
pub trait Engine {
    /// Name used as the sender of the engine's diagnostics.
    fn name(&self) -> &str;

    /// Make sure the engine is present and recent enough.
    ///
    /// Fails with [`Error::Setup`](crate::Error::Setup) otherwise.
    fn check(&self) -> Result<semver::Version>;

    /// Read the input files into a document tree.
    fn load(&self, options: &EngineOptions, diag: &Diagnostics) -> Result<Ast>;

    /// Parse a YAML metadata block into typed metadata.
    fn read_metadata(&self, yaml: &str, diag: &Diagnostics) -> Result<MetaMap>;

    /// Render a tree with the configured writer.
    ///
    /// Returns the rendered text, or `None` when the engine wrote the target
    /// itself (binary or PDF output).
    fn convert(
        &self,
        ast: &Ast,
        options: &EngineOptions,
        template: Option<&str>,
        diag: &Diagnostics,
    ) -> Result<Option<String>>;
}
