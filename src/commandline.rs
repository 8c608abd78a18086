//! Engine options set by styles.
//!
//! A style may carry a `commandline` map of engine options:
//!
//! ```yaml
//! Report:
//!   all-writers:
//!     commandline:
//!       toc: true
//!       toc-depth: "`2`"
//!       variable:
//!         - "`fontsize=12pt`"
//!         - "`geometry=a4paper`"
//! ```
//!
//! `true` gives `--toc`, `false` drops the option, inline code gives
//! `--toc-depth=2`, and a list of inline code repeats an additive option.
//! Layers merge the map key by key. Options given on the command line win
//! over the same options set here.

use crate::diagnostics::Diagnostics;
use crate::meta::{get_map, LookupError, MetaKind, MetaMap, MetaValue};
use crate::options::EngineOptions;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Metadata field holding engine options.
pub const COMMANDLINE_FIELD: &str = "commandline";

/// Options panstyle sets itself; a style may not set them.
pub const FORBIDDEN: &[&str] = &[
    "from", "read", "to", "write", "output", "filter", "lua-filter", "template",
    "help", "version", "list-input-formats", "list-output-formats",
];

/// Options that may be given more than once.
pub const ADDITIVE: &[&str] = &[
    "variable", "metadata", "css", "include-in-header", "include-before-body",
    "include-after-body", "bibliography", "epub-embed-font", "pdf-engine-opt",
    "latex-engine-opt", "resource-path",
];

/// When an option takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionPhase {
    /// While the source is read
    Read,
    /// While the output is written
    Write,
    Both,
}

const KNOWN: &[(&str, OptionPhase)] = &[
    ("abbreviations", OptionPhase::Read),
    ("default-image-extension", OptionPhase::Read),
    ("extract-media", OptionPhase::Read),
    ("file-scope", OptionPhase::Read),
    ("indented-code-classes", OptionPhase::Read),
    ("preserve-tabs", OptionPhase::Read),
    ("strip-comments", OptionPhase::Read),
    ("tab-stop", OptionPhase::Read),
    ("track-changes", OptionPhase::Read),
    ("ascii", OptionPhase::Write),
    ("columns", OptionPhase::Write),
    ("css", OptionPhase::Write),
    ("dpi", OptionPhase::Write),
    ("email-obfuscation", OptionPhase::Write),
    ("embed-resources", OptionPhase::Write),
    ("eol", OptionPhase::Write),
    ("epub-chapter-level", OptionPhase::Write),
    ("epub-cover-image", OptionPhase::Write),
    ("epub-embed-font", OptionPhase::Write),
    ("epub-metadata", OptionPhase::Write),
    ("highlight-style", OptionPhase::Write),
    ("html-q-tags", OptionPhase::Write),
    ("id-prefix", OptionPhase::Write),
    ("include-after-body", OptionPhase::Write),
    ("include-before-body", OptionPhase::Write),
    ("include-in-header", OptionPhase::Write),
    ("incremental", OptionPhase::Write),
    ("latex-engine", OptionPhase::Write),
    ("latex-engine-opt", OptionPhase::Write),
    ("listings", OptionPhase::Write),
    ("no-highlight", OptionPhase::Write),
    ("number-offset", OptionPhase::Write),
    ("number-sections", OptionPhase::Write),
    ("pdf-engine", OptionPhase::Write),
    ("pdf-engine-opt", OptionPhase::Write),
    ("reference-doc", OptionPhase::Write),
    ("reference-links", OptionPhase::Write),
    ("reference-location", OptionPhase::Write),
    ("section-divs", OptionPhase::Write),
    ("self-contained", OptionPhase::Write),
    ("slide-level", OptionPhase::Write),
    ("standalone", OptionPhase::Write),
    ("table-of-contents", OptionPhase::Write),
    ("title-prefix", OptionPhase::Write),
    ("toc", OptionPhase::Write),
    ("toc-depth", OptionPhase::Write),
    ("top-level-division", OptionPhase::Write),
    ("variable", OptionPhase::Write),
    ("wrap", OptionPhase::Write),
    ("bibliography", OptionPhase::Both),
    ("citation-abbreviations", OptionPhase::Both),
    ("citeproc", OptionPhase::Both),
    ("csl", OptionPhase::Both),
    ("data-dir", OptionPhase::Both),
    ("katex", OptionPhase::Both),
    ("mathjax", OptionPhase::Both),
    ("mathml", OptionPhase::Both),
    ("metadata", OptionPhase::Both),
    ("resource-path", OptionPhase::Both),
    ("webtex", OptionPhase::Both),
];

/// Phase of a known option.
pub fn option_phase(name: &str) -> Option<OptionPhase> {
    KNOWN
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, phase)| phase)
}

pub fn is_additive(name: &str) -> bool {
    ADDITIVE.contains(&name)
}

/// Value of one engine option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `--name`
    Flag,
    /// `--name=value`
    Value(String),
    /// `--name=a --name=b ...`, additive options only
    Values(Vec<String>),
}

/// Engine options by name.
pub type EngineArgs = BTreeMap<String, OptionValue>;

/// Merge the `commandline` map of `new` into the one in `old`, key by key.
///
/// A non-map on either side is reported and leaves `old` as it was.
pub fn merge_commandline(old: &mut MetaMap, new: &mut MetaMap, diag: &Diagnostics) {
    let incoming = match new.remove(COMMANDLINE_FIELD) {
        Some(MetaValue::Map(map)) => map,
        Some(other) => {
            diag.warn(wrong_type(MetaKind::Map, &other));
            return;
        }
        None => return,
    };
    match old.get_mut(COMMANDLINE_FIELD) {
        Some(MetaValue::Map(existing)) => existing.extend(incoming),
        Some(other) => diag.warn(wrong_type(MetaKind::Map, other)),
        None => {
            if !incoming.is_empty() {
                old.insert(COMMANDLINE_FIELD.to_string(), MetaValue::Map(incoming));
            }
        }
    }
}

/// Read the `commandline` field into the options that apply when writing.
///
/// Forbidden, unknown and unreadable entries are reported as errors and
/// skipped. Read-only options are reported as warnings, since the source
/// has already been read by the time styles are resolved.
pub fn parse_commandline(metadata: &MetaMap, diag: &Diagnostics) -> EngineArgs {
    let mut args = EngineArgs::new();
    let entries = match get_map(metadata, COMMANDLINE_FIELD) {
        Ok(entries) => entries,
        Err(LookupError::Missing(_)) => return args,
        Err(err) => {
            diag.error(format!("{}---ignoring it", err));
            return args;
        }
    };

    for (name, value) in entries {
        if FORBIDDEN.contains(&name.as_str()) {
            diag.error(format!(
                "\"{}\" forbidden entry in \"{}\" map---ignoring",
                name, COMMANDLINE_FIELD
            ));
            continue;
        }
        let Some(phase) = option_phase(name) else {
            diag.error(format!(
                "do not recognise option \"--{}\" in \"{}\" map---ignoring",
                name, COMMANDLINE_FIELD
            ));
            continue;
        };
        let value = match read_value(name, value) {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(message) => {
                diag.error(message);
                continue;
            }
        };
        if phase == OptionPhase::Read {
            diag.warn(format!(
                "option \"--{}\" only applies when reading the source---ignoring",
                name
            ));
            continue;
        }
        args.insert(name.clone(), value);
    }
    args
}

fn read_value(name: &str, value: &MetaValue) -> Result<Option<OptionValue>, String> {
    let additive = is_additive(name);
    match value {
        MetaValue::Bool(false) => Ok(None),
        MetaValue::Bool(true) if !additive => Ok(Some(OptionValue::Flag)),
        MetaValue::List(items) if additive => items
            .iter()
            .map(|item| {
                single_value(item).ok_or_else(|| {
                    format!(
                        "cannot read option \"{}\" in \"{}\"; syntax should be - {}: \"`VALUE`\"",
                        name, COMMANDLINE_FIELD, name
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|values| Some(OptionValue::Values(values))),
        MetaValue::Inlines(_) | MetaValue::String(_) => match single_value(value) {
            Some(text) if additive => Ok(Some(OptionValue::Values(vec![text]))),
            Some(text) => Ok(Some(OptionValue::Value(text))),
            None => Err(format!(
                "cannot read option \"{}\" in \"{}\"; syntax should be {}: \"`VALUE`\"",
                name, COMMANDLINE_FIELD, name
            )),
        },
        other => Err(format!(
            "cannot read entry \"{}\" of type \"{}\" in \"{}\"---ignoring",
            name,
            other.kind(),
            COMMANDLINE_FIELD
        )),
    }
}

/// Text of a single inline code span, or of a plain string.
fn single_value(value: &MetaValue) -> Option<String> {
    match value {
        MetaValue::String(text) => Some(text.clone()),
        MetaValue::Inlines(nodes) => match nodes.as_slice() {
            [node] if node.get("t").and_then(Value::as_str) == Some("Code") => node
                .get("c")
                .and_then(|c| c.get(1))
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        },
        _ => None,
    }
}

/// Render options as engine arguments.
pub fn to_arguments(args: &EngineArgs) -> Vec<String> {
    let mut out = Vec::new();
    for (name, value) in args {
        match value {
            OptionValue::Flag => out.push(format!("--{}", name)),
            OptionValue::Value(v) => out.push(format!("--{}={}", name, v)),
            OptionValue::Values(vs) => out.extend(vs.iter().map(|v| format!("--{}={}", name, v))),
        }
    }
    out
}

/// Long options already present in verbatim engine arguments.
///
/// Only `--name` and `--name=value` forms are recognised.
pub fn parse_arguments(arguments: &[String]) -> EngineArgs {
    let mut args = EngineArgs::new();
    for argument in arguments {
        let Some(body) = argument.strip_prefix("--").filter(|b| !b.is_empty()) else {
            continue;
        };
        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name, OptionValue::Value(value.to_string())),
            None => (body, OptionValue::Flag),
        };
        let merged = match (args.remove(name), value) {
            (Some(OptionValue::Values(mut values)), OptionValue::Value(v)) => {
                values.push(v);
                OptionValue::Values(values)
            }
            (Some(OptionValue::Value(first)), OptionValue::Value(v)) => OptionValue::Values(vec![first, v]),
            (_, value) => value,
        };
        args.insert(name.to_string(), merged);
    }
    args
}

/// Add the style options in `metadata` to the engine arguments.
///
/// The command line wins: an option it already sets is kept and the style's
/// setting is dropped with a warning, unless both agree. Additive options
/// are appended after the command line's.
pub fn apply(engine: &mut EngineOptions, metadata: &MetaMap, diag: &Diagnostics) {
    let styled = parse_commandline(metadata, diag);
    if styled.is_empty() {
        return;
    }
    let given = parse_arguments(&engine.options);

    let mut extra = EngineArgs::new();
    for (name, value) in styled {
        match given.get(&name) {
            None => {
                extra.insert(name, value);
            }
            Some(_) if is_additive(&name) => {
                extra.insert(name, value);
            }
            Some(existing) if *existing == value => {}
            Some(existing) => diag.warn(format!(
                "command line option \"{}\" overriding setting in \"{}\" metadata",
                Shown(&name, existing),
                COMMANDLINE_FIELD
            )),
        }
    }

    let arguments = to_arguments(&extra);
    if !arguments.is_empty() {
        diag.info(format!("options from styles: {}", arguments.join(" ")));
        engine.options.extend(arguments);
    }
}

struct Shown<'a>(&'a str, &'a OptionValue);

impl fmt::Display for Shown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            OptionValue::Flag => write!(f, "--{}", self.0),
            OptionValue::Value(v) => write!(f, "--{}={}", self.0, v),
            OptionValue::Values(vs) => {
                let shown: Vec<_> = vs.iter().map(|v| format!("--{}={}", self.0, v)).collect();
                f.write_str(&shown.join(" "))
            }
        }
    }
}

fn wrong_type(expected: MetaKind, found: &MetaValue) -> LookupError {
    LookupError::WrongType {
        field: COMMANDLINE_FIELD.to_string(),
        expected,
        found: found.kind(),
    }
}
