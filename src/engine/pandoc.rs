//! `pandoc` as the conversion engine.

use super::Engine;
use crate::ast::Ast;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::{Error, Result};
use crate::exec::process::{self, ProcessOutput};
use crate::meta::MetaMap;
use crate::options::{EngineOptions, STDIO};
use regex::Regex;
use semver::Version;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

/// Oldest pandoc release with the JSON interface this crate relies on.
pub const MINIMUM_VERSION: &str = "1.12.1";

/// Extract the version from `pandoc --version` output.
///
/// Only the first three components are kept; missing ones count as zero.
pub fn parse_version(text: &str) -> Option<Version> {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    let re = VERSION.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)*)").unwrap());

    let first_line = text.lines().next()?;
    let digits = re.captures(first_line)?.get(1)?.as_str();
    let mut parts = digits.split('.').map(|p| p.parse::<u64>().ok());
    let mut next = || parts.next().flatten().unwrap_or(0);
    Some(Version::new(next(), next(), next()))
}

/// The `pandoc` executable.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: PathBuf,
}

impl Default for Pandoc {
    fn default() -> Self {
        Self::new()
    }
}

impl Pandoc {
    /// Use `pandoc` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
        }
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    fn run(
        &self,
        mut command: Command,
        input: Option<&[u8]>,
        capture_stdout: bool,
        diag: &Diagnostics,
    ) -> Result<ProcessOutput> {
        diag.debug(format!("run {:?}", command));
        let output = process::run(&mut command, input, capture_stdout).map_err(|source| {
            Error::Process {
                program: self.program.display().to_string(),
                source,
            }
        })?;
        // pandoc writes plain text warnings, not structured records
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            diag.emit(Severity::Warning, self.name(), line);
        }
        if !output.success() {
            return Err(Error::Engine(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Ok(output)
    }

    fn text<'o>(&self, output: &'o ProcessOutput) -> Result<&'o str> {
        output.stdout_text().map_err(|e| {
            Error::Engine(format!(
                "{} produced output that is not UTF-8: {}",
                self.program.display(),
                e
            ))
        })
    }
}

impl Engine for Pandoc {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn check(&self) -> Result<Version> {
        let output = process::run(self.command().arg("--version"), None, true).map_err(|e| {
            Error::Setup(format!(
                "could not run \"{}\": {}",
                self.program.display(),
                e
            ))
        })?;
        let found = parse_version(self.text(&output)?)
            .ok_or_else(|| Error::Setup("could not read the pandoc version".into()))?;
        let minimum = Version::parse(MINIMUM_VERSION)
            .map_err(|e| Error::Internal(e.to_string()))?;
        if found < minimum {
            return Err(Error::Setup(format!(
                "pandoc {} or greater required, found pandoc {}",
                minimum, found
            )));
        }
        Ok(found)
    }

    fn load(&self, options: &EngineOptions, diag: &Diagnostics) -> Result<Ast> {
        let mut command = self.command();
        command.args(&options.input);
        if let Some(reader) = &options.read {
            command.args(["--from", reader.as_str()]);
        }
        command.args(["--to", "json", "--output", STDIO]);
        command.args(&options.options);

        diag.debug("loading source document(s)");
        let output = self.run(command, None, true, diag)?;
        Ast::parse(self.text(&output)?)
    }

    fn read_metadata(&self, yaml: &str, diag: &Diagnostics) -> Result<MetaMap> {
        let block = format!("---\n{}\n...\n", yaml.trim_end());
        let mut command = self.command();
        command.args([STDIO, "--from", "markdown", "--to", "json", "--output", STDIO]);
        let output = self.run(command, Some(block.as_bytes()), true, diag)?;
        Ok(Ast::parse(self.text(&output)?)?.metadata().clone())
    }

    fn convert(
        &self,
        ast: &Ast,
        options: &EngineOptions,
        template: Option<&str>,
        diag: &Diagnostics,
    ) -> Result<Option<String>> {
        let binary = options.binary_output();
        let target = if binary { options.output.as_str() } else { STDIO };

        let mut command = self.command();
        command.args([STDIO, "--from", "json", "--to", options.write.as_str(), "--output", target]);
        if let Some(template) = template {
            command.arg(format!("--template={}", template));
        }
        command.args(&options.options);

        let input = ast.to_json_string();
        let output = self.run(command, Some(input.as_bytes()), !binary, diag)?;
        if binary {
            return Ok(None);
        }
        Ok(Some(self.text(&output)?.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("pandoc 3.1.11.1\nFeatures: +server +lua"),
            Some(Version::new(3, 1, 11))
        );
        assert_eq!(parse_version("pandoc.exe 1.12"), Some(Version::new(1, 12, 0)));
        assert_eq!(parse_version("pandoc 2"), Some(Version::new(2, 0, 0)));
        assert_eq!(parse_version("no digits here"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_minimum_version_ordering() {
        let minimum = Version::parse(MINIMUM_VERSION).unwrap();
        assert!(parse_version("pandoc 1.12.0").unwrap() < minimum);
        assert!(parse_version("pandoc 1.12.1").unwrap() >= minimum);
        assert!(parse_version("pandoc 1.13").unwrap() > minimum);
    }

    #[test]
    fn test_missing_binary_is_setup_error() {
        let pandoc = Pandoc::with_program("/nonexistent/pandoc");
        assert!(pandoc.check().unwrap_err().is_setup());
    }
}
