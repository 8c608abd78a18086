//! The support directory and other setup-time resources.
//!
//! The support directory holds the global style definitions
//! (`styles.yaml`), one subdirectory per phase with the programs styles may
//! refer to, a `template` directory, and a `shared` directory exported to
//! every pipeline program.

use crate::diagnostics::Diagnostics;
use crate::engine::Engine;
use crate::error::Result;
use crate::meta::MetaMap;
use crate::options::{default_support_dir, Options, STDIO};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// File holding the global style definitions.
pub const STYLES_FILE: &str = "styles.yaml";

/// Environment variable pointing pipeline programs at the shared directory.
pub const SHARED_ENV: &str = "PANSTYLE_SHARED";

/// Make sure the configured support directory exists.
///
/// A missing custom directory is an error and the default is used instead.
/// A missing default directory is only a warning.
pub fn check_support_dir(options: &mut Options, diag: &Diagnostics) {
    let default = default_support_dir();
    if options.general.support != default && !options.general.support.is_dir() {
        diag.error(format!(
            "support directory \"{}\" not found",
            options.general.support.display()
        ));
        diag.warn(format!(
            "using default support directory \"{}\"",
            default.display()
        ));
        options.general.support = default.clone();
    }
    if !default.is_dir() {
        diag.warn(format!(
            "default support directory \"{}\" not found",
            default.display()
        ));
    }
}

/// Load the global style definitions from `<support>/styles.yaml`.
///
/// A missing file is reported and yields no definitions.
pub fn load_styledef(engine: &dyn Engine, support: &Path, diag: &Diagnostics) -> Result<MetaMap> {
    let path = support.join(STYLES_FILE);
    if !path.is_file() {
        diag.error(format!("styles file not found: \"{}\"", path.display()));
        return Ok(MetaMap::new());
    }
    diag.debug(format!("loading global style definitions from \"{}\"", path.display()));
    let yaml = fs::read_to_string(&path)?;
    engine.read_metadata(&yaml, diag)
}

/// Standard input captured into a temporary file.
///
/// The engine reads input files by name, so `-` inputs are replaced by this
/// file. [`StdinStage::teardown`] deletes it; later calls do nothing.
#[derive(Debug)]
pub struct StdinStage {
    file: Option<TempPath>,
}

impl StdinStage {
    /// Copy `reader` into a new `__panstyle-*__` file inside `dir`.
    pub fn capture(mut reader: impl Read, dir: &Path) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("__panstyle-")
            .suffix("__")
            .tempfile_in(dir)?;
        io::copy(&mut reader, &mut file)?;
        file.flush()?;
        Ok(Self {
            file: Some(file.into_temp_path()),
        })
    }

    /// Path of the staged file, until torn down.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Replace every `-` in `inputs` with the staged file, and record it in
    /// `options`.
    pub fn substitute(&self, options: &mut Options) {
        let Some(path) = self.path() else {
            return;
        };
        let name = path.to_string_lossy();
        for input in options.engine.input.iter_mut().filter(|i| i.as_str() == STDIO) {
            *input = name.to_string();
        }
        options.general.stdin_temp_file = Some(PathBuf::from(path));
    }

    /// Delete the staged file.
    pub fn teardown(&mut self, diag: &Diagnostics) -> Result<()> {
        if let Some(file) = self.file.take() {
            let path = file.to_path_buf();
            file.close()?;
            diag.debug(format!("deleted temporary file \"{}\"", path.display()));
        }
        Ok(())
    }
}
