//! Run configuration.
//!
//! Options are split into the tool's own settings and the settings passed
//! through to the conversion engine. Both travel to scripts inside the
//! control message, serialized as `{"panstyle": {...}, "pandoc": {...}}`.

use crate::detect::{self, DEFAULT_WRITER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the support directory under the user's home.
pub const SUPPORT_DIR_NAME: &str = ".panstyle";

/// Environment variable overriding the support directory.
pub const SUPPORT_ENV: &str = "PANSTYLE_SUPPORT";

/// Marker for standard input / standard output.
pub const STDIO: &str = "-";

/// Options for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Settings of the tool itself
    #[serde(rename = "panstyle")]
    pub general: GeneralOptions,

    /// Settings passed through to the conversion engine
    #[serde(rename = "pandoc")]
    pub engine: EngineOptions,
}

/// Tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralOptions {
    /// Support directory holding styles and pipeline programs
    pub support: PathBuf,

    /// Abort on the first reported error
    pub strict: bool,

    /// Prefix for debug output files (`PREFIX.log`, `PREFIX.json`)
    pub debug: Option<String>,

    /// File holding captured standard input, if any
    pub stdin_temp_file: Option<PathBuf>,
}

impl Default for GeneralOptions {
    fn default() -> Self {
        Self {
            support: default_support_dir(),
            strict: false,
            debug: None,
            stdin_temp_file: None,
        }
    }
}

/// Conversion engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Input files
    pub input: Vec<String>,

    /// Output target, `-` for standard output
    pub output: String,

    /// Whether the output is a PDF produced by the engine
    pub pdf_output: bool,

    /// Reader name
    pub read: Option<String>,

    /// Writer name, filled in by [`Options::finalize`] when not given
    pub write: String,

    /// Template given on the command line; wins over a style's template
    pub template: Option<String>,

    /// Filters given on the command line, run before styled filters
    pub filter: Vec<String>,

    /// Remaining arguments passed verbatim to the engine
    pub options: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            output: STDIO.to_string(),
            pdf_output: false,
            read: None,
            write: String::new(),
            template: None,
            filter: Vec::new(),
            options: Vec::new(),
        }
    }
}

impl EngineOptions {
    /// Whether the engine writes the target itself instead of returning text.
    pub fn binary_output(&self) -> bool {
        self.pdf_output || detect::is_binary_writer(&self.write)
    }

    /// Whether the output goes to standard output.
    pub fn to_stdout(&self) -> bool {
        self.output == STDIO
    }
}

impl Options {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the support directory.
    pub fn with_support(mut self, support: impl Into<PathBuf>) -> Self {
        self.general.support = support.into();
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.general.strict = strict;
        self
    }

    /// Set the debug output prefix.
    pub fn with_debug(mut self, prefix: impl Into<String>) -> Self {
        self.general.debug = Some(prefix.into());
        self
    }

    /// Set the input files.
    pub fn with_input<I, S>(mut self, input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engine.input = input.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output target.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.engine.output = output.into();
        self
    }

    /// Set the reader.
    pub fn with_reader(mut self, reader: impl Into<String>) -> Self {
        self.engine.read = Some(reader.into());
        self
    }

    /// Set the writer explicitly.
    pub fn with_writer(mut self, writer: impl Into<String>) -> Self {
        self.engine.write = writer.into();
        self
    }

    /// Set a template that overrides any style template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.engine.template = Some(template.into());
        self
    }

    /// Add a command-line filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.engine.filter.push(filter.into());
        self
    }

    /// Add extra arguments for the engine.
    pub fn with_engine_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engine.options.extend(args.into_iter().map(Into::into));
        self
    }

    /// Derive the settings that depend on others.
    ///
    /// A `.pdf` output sets `pdf_output`. The writer is, in order: the one
    /// given explicitly, `html` for standard output, the one implied by the
    /// output extension, and `html` otherwise.
    pub fn finalize(mut self) -> Self {
        if detect::is_pdf_output(&self.engine.output) {
            self.engine.pdf_output = true;
        }
        if self.engine.write.is_empty() {
            self.engine.write = if self.engine.to_stdout() {
                DEFAULT_WRITER.to_string()
            } else {
                detect::writer_for_output(&self.engine.output)
                    .unwrap_or(DEFAULT_WRITER)
                    .to_string()
            };
        }
        self
    }

    /// The active writer.
    pub fn writer(&self) -> &str {
        &self.engine.write
    }

    pub fn support(&self) -> &Path {
        &self.general.support
    }
}

/// `$HOME/.panstyle`, or `.panstyle` when no home directory is known.
pub fn default_support_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(SUPPORT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = Options::new()
            .with_support("/tmp/support")
            .with_strict(true)
            .with_input(["a.md", "b.md"])
            .with_filter("first")
            .with_filter("second")
            .with_engine_args(["--toc"]);

        assert_eq!(options.support(), Path::new("/tmp/support"));
        assert!(options.general.strict);
        assert_eq!(options.engine.input, vec!["a.md", "b.md"]);
        assert_eq!(options.engine.filter, vec!["first", "second"]);
        assert_eq!(options.engine.options, vec!["--toc"]);
    }

    #[test]
    fn test_writer_inference() {
        assert_eq!(Options::new().finalize().writer(), "html");
        assert_eq!(Options::new().with_output("x.tex").finalize().writer(), "latex");
        assert_eq!(Options::new().with_output("x.weird").finalize().writer(), "html");
        assert_eq!(
            Options::new()
                .with_output("x.tex")
                .with_writer("beamer")
                .finalize()
                .writer(),
            "beamer"
        );
    }

    #[test]
    fn test_pdf_output() {
        let options = Options::new().with_output("paper.pdf").finalize();
        assert!(options.engine.pdf_output);
        assert_eq!(options.writer(), "latex");
        assert!(options.engine.binary_output());
    }

    #[test]
    fn test_binary_writer_output() {
        let options = Options::new().with_output("paper.docx").finalize();
        assert!(!options.engine.pdf_output);
        assert!(options.engine.binary_output());
    }

    #[test]
    fn test_serialized_sections() {
        let value = serde_json::to_value(Options::new().finalize()).unwrap();
        assert!(value["panstyle"]["support"].is_string());
        assert_eq!(value["pandoc"]["output"], "-");
        assert_eq!(value["pandoc"]["write"], "html");
    }
}
