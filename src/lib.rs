//! # panstyle
//!
//! Styles for pandoc.
//!
//! A document names one or more styles in its metadata. Styles are defined
//! in a style database (the support directory's `styles.yaml`, plus any
//! definitions inside the document itself) and may inherit from each other.
//! Resolving them yields the document's final metadata and a run list of
//! external programs that run around the conversion:
//!
//! | phase         | input                    | output             |
//! |---------------|--------------------------|--------------------|
//! | `preflight`   | control message          | (side effects)     |
//! | `filter`      | document tree (JSON)     | document tree      |
//! | *engine*      | document tree            | rendered text      |
//! | `postprocess` | rendered text            | rendered text      |
//! | `postflight`  | control message          | (side effects)     |
//! | `cleanup`     | control message          | (side effects)     |
//!
//! ## Quick Start
//!
//! ```no_run
//! use panstyle::{Diagnostics, Options, Pandoc};
//!
//! fn main() -> panstyle::Result<()> {
//!     let options = Options::new()
//!         .with_input(["notes.md"])
//!         .with_output("notes.tex")
//!         .finalize();
//!     let diag = Diagnostics::new();
//!     panstyle::run(&Pandoc::new(), options, &diag)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Style definitions
//!
//! ```yaml
//! Report:
//!   parent: Base
//!   all-writers:
//!     filter:
//!       - run: smallcaps.py
//!   latex:
//!     template: report.tex
//!     postflight:
//!       - run: latexmk.py
//! ```
//!
//! Scalar fields from later layers replace earlier ones; the pipeline fields
//! accumulate. `kill: name` and `killall: true` items remove entries added by
//! earlier layers. A `commandline` map sets engine options (see
//! [`commandline`]).

pub mod ast;
pub mod commandline;
pub mod detect;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod exec;
pub mod message;
pub mod meta;
pub mod options;
pub mod runlist;
pub mod style;
pub mod support;

// Re-export commonly used types
pub use ast::Ast;
pub use diagnostics::{Diagnostics, Severity};
pub use document::Document;
pub use engine::{Engine, Pandoc};
pub use error::{Error, Result};
pub use exec::{Executor, FailurePolicy};
pub use message::ControlMessage;
pub use meta::{LookupError, MetaKind, MetaMap, MetaValue};
pub use options::{EngineOptions, GeneralOptions, Options};
pub use runlist::{Phase, RunList, RunListEntry, Status};
pub use support::StdinStage;

use std::fs;

/// Load, resolve and plan a document without running anything.
///
/// The returned document has its final metadata, template and run list, and
/// carries the control message in its metadata. Errors reported along the
/// way are only counted here; strict mode acts on them when the run list
/// executes, so that its cleanup entries still run.
pub fn prepare(engine: &dyn Engine, mut options: Options, diag: &Diagnostics) -> Result<Document> {
    support::check_support_dir(&mut options, diag);
    let global = support::load_styledef(engine, options.support(), diag)?;
    let ast = engine.load(&options.engine, diag)?;

    let mut doc = Document::new(options);
    doc.populate(ast, global, diag)?;
    doc.transform(diag);
    doc.build_run_list(diag);
    doc.purge_style_fields();
    doc.inject_control_message()?;
    Ok(doc)
}

/// Check the engine, prepare the document and run its pipeline.
///
/// With a debug prefix set, the final control message is written to
/// `PREFIX.json` whether or not the pipeline succeeded.
pub fn run(engine: &dyn Engine, options: Options, diag: &Diagnostics) -> Result<Document> {
    let version = engine.check()?;
    diag.info(format!("{} {}", engine.name(), version));

    let mut doc = prepare(engine, options, diag)?;
    let result = Executor::new(engine, diag).execute(&mut doc);
    if let Some(prefix) = &doc.options.general.debug {
        write_debug_message(&doc, prefix)?;
    }
    result.map(|()| doc)
}

fn write_debug_message(doc: &Document, prefix: &str) -> Result<()> {
    let path = format!("{}.json", prefix);
    let text = serde_json::to_string_pretty(&(doc.control_message(),))?;
    fs::write(&path, text)?;
    log::debug!("control message written to \"{}\"", path);
    Ok(())
}
