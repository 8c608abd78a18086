//! The document being processed and the state resolved for it.

use crate::ast::Ast;
use crate::commandline::{self, COMMANDLINE_FIELD};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::message::{ControlMessage, RESERVED_FIELD};
use crate::meta::{get_map, get_text, list_or_scalar, LookupError, MetaMap};
use crate::options::Options;
use crate::runlist::{self, resolve_path, Phase, RunList};
use crate::style;
use std::fs;
use std::io::{self, Write};

/// Metadata field naming the requested style(s).
pub const STYLE_FIELD: &str = "style";

/// Metadata field holding document-local style definitions.
pub const STYLEDEF_FIELD: &str = "styledef";

/// Metadata field naming the template; also the template lookup directory.
pub const TEMPLATE_FIELD: &str = "template";

/// A document with its styles, run list and output.
///
/// Built empty, filled by [`Document::populate`], rewritten by
/// [`Document::transform`], then handed to the executor.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Full document tree
    pub ast: Ast,

    /// Requested styles that have a definition
    pub style: Vec<String>,

    /// Requested styles with every ancestor, parents first
    pub stylefull: Vec<String>,

    /// Global definitions overridden by local ones
    pub styledef: MetaMap,

    pub runlist: RunList,

    pub options: Options,

    /// Template resolved from the styles
    pub template: Option<String>,

    /// Rendered output, once the engine has run
    pub output: Option<String>,
}

impl Document {
    /// Create an empty document.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Take in the loaded tree and the global style definitions.
    ///
    /// Fails only when the style definitions are cyclic.
    pub fn populate(&mut self, ast: Ast, global_styledef: MetaMap, diag: &Diagnostics) -> Result<()> {
        self.ast = ast;
        if self.ast.metadata().contains_key(RESERVED_FIELD) {
            diag.error(format!(
                "special field \"{}\" already in metadata---will be overwritten",
                RESERVED_FIELD
            ));
        }
        self.populate_styledef(global_styledef, diag);
        self.populate_style(diag)
    }

    fn populate_styledef(&mut self, global: MetaMap, diag: &Diagnostics) {
        if global.is_empty() {
            diag.info("no global style definitions loaded");
        } else {
            diag.info(format!(
                "global definitions: {}",
                global.keys().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        self.styledef = global;

        match get_map(self.ast.metadata(), STYLEDEF_FIELD) {
            Ok(local) => {
                for (name, def) in local {
                    if self.styledef.contains_key(name) {
                        diag.info(format!("local definition \"{}\" overrides global", name));
                    }
                    self.styledef.insert(name.clone(), def.clone());
                }
            }
            Err(LookupError::Missing(_)) => {}
            Err(err) => diag.error(err),
        }
    }

    fn populate_style(&mut self, diag: &Diagnostics) -> Result<()> {
        let requested = match list_or_scalar(self.ast.metadata(), STYLE_FIELD) {
            Ok(styles) => styles,
            Err(LookupError::Missing(_)) => {
                diag.info("no \"style\" field found, will just run the engine");
                Vec::new()
            }
            Err(err) => {
                diag.error(err);
                Vec::new()
            }
        };

        let missing = style::missing_styles(&requested, &self.styledef);
        for name in &missing {
            diag.error(format!(
                "style definition for \"{}\" not found---ignoring style",
                name
            ));
        }
        self.style = requested
            .into_iter()
            .filter(|s| !missing.contains(s))
            .collect();
        self.stylefull = style::expand(&self.style, &self.styledef, diag)?;

        if !self.style.is_empty() {
            diag.info(format!("style: {}", self.style.join(", ")));
            diag.info(format!("full hierarchy: {}", self.stylefull.join(", ")));
        }
        Ok(())
    }

    /// Replace the metadata with the style-resolved metadata, pick the
    /// template and add the engine options the styles set.
    pub fn transform(&mut self, diag: &Diagnostics) {
        let writer = self.options.writer().to_string();
        diag.info(format!("writer \"{}\"", writer));

        let mut merged = style::resolve(
            self.ast.metadata(),
            &self.styledef,
            &self.stylefull,
            &writer,
            diag,
        );
        style::apply_kill_rules_to_metadata(&mut merged, diag);
        commandline::apply(&mut self.options.engine, &merged, diag);

        match get_text(&merged, TEMPLATE_FIELD) {
            Ok(name) => {
                let path = resolve_path(&name, TEMPLATE_FIELD, self.options.support());
                diag.info(format!("template \"{}\"", path));
                self.template = Some(path);
            }
            Err(LookupError::Missing(_)) => {}
            Err(err) => diag.warn(err),
        }

        self.ast.set_metadata(merged);
    }

    /// Build the run list from the transformed metadata.
    pub fn build_run_list(&mut self, diag: &Diagnostics) {
        self.runlist = runlist::build_run_list(self.ast.metadata(), &self.options, diag);
    }

    /// Remove the fields that only steer styling from the metadata.
    pub fn purge_style_fields(&mut self) {
        let meta = self.ast.metadata_mut();
        for field in [STYLE_FIELD, STYLEDEF_FIELD, TEMPLATE_FIELD, COMMANDLINE_FIELD] {
            meta.remove(field);
        }
        for phase in Phase::ALL {
            meta.remove(phase.name());
        }
    }

    /// Snapshot of the resolved state.
    pub fn control_message(&self) -> ControlMessage {
        let mut metadata = self.ast.metadata().clone();
        metadata.remove(RESERVED_FIELD);
        ControlMessage {
            metadata,
            template: self.template.clone(),
            style: self.style.clone(),
            stylefull: self.stylefull.clone(),
            styledef: self.styledef.clone(),
            runlist: self.runlist.clone(),
            options: self.options.clone(),
        }
    }

    /// Store a fresh control message in the metadata and return its text.
    pub fn inject_control_message(&mut self) -> Result<String> {
        let message = self.control_message();
        let reserved = message.to_reserved()?;
        self.ast
            .metadata_mut()
            .insert(RESERVED_FIELD.to_string(), reserved);
        message.to_json_string()
    }

    /// Template for the engine: the command line wins over the styles.
    pub fn effective_template(&self) -> Option<&str> {
        self.options
            .engine
            .template
            .as_deref()
            .or(self.template.as_deref())
    }

    /// Write the rendered output to its target.
    ///
    /// Does nothing when the engine wrote the target itself.
    pub fn write_output(&self, diag: &Diagnostics) -> Result<()> {
        if self.options.engine.binary_output() {
            return Ok(());
        }
        let Some(output) = &self.output else {
            diag.error("no output produced");
            return Ok(());
        };
        if self.options.engine.to_stdout() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        } else {
            fs::write(&self.options.engine.output, output)?;
            diag.info(format!("output written to \"{}\"", self.options.engine.output));
        }
        Ok(())
    }
}
