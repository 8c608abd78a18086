//! Construction of the run list from resolved metadata.

use super::entry::{Phase, RunList, RunListEntry};
use super::resolve::resolve_path;
use crate::diagnostics::Diagnostics;
use crate::meta::{get_list, get_text, LookupError, MetaMap, MetaValue};
use crate::options::Options;
use crate::style::RUN;

/// Field of a pipeline item holding its arguments.
pub const ARGS: &str = "args";

/// Build the run list for every phase.
///
/// Command-line filters come first in the filter phase and are used as
/// given. Filters receive the writer name as their first argument.
/// Postprocess entries are skipped when the engine writes binary or PDF
/// output itself.
pub fn build_run_list(meta: &MetaMap, options: &Options, diag: &Diagnostics) -> RunList {
    let mut runlist = RunList::new();
    for phase in Phase::ALL {
        let mut entries = Vec::new();
        if phase == Phase::Filter {
            entries.extend(
                options
                    .engine
                    .filter
                    .iter()
                    .map(|f| RunListEntry::new(Phase::Filter, f.as_str())),
            );
        }
        entries.extend(entries_for_phase(meta, phase, options, diag));

        if phase == Phase::Postprocess && options.engine.binary_output() && !entries.is_empty() {
            diag.info("postprocess skipped---output is binary or PDF");
            continue;
        }
        if phase == Phase::Filter {
            for entry in &mut entries {
                entry.arguments.insert(0, options.writer().to_string());
            }
        }
        runlist.extend(entries);
    }

    for (i, entry) in runlist.iter().enumerate() {
        diag.info(format!(
            "{:>2} {:<11} \"{}\"",
            i + 1,
            entry.kind.name(),
            entry.command
        ));
    }
    runlist
}

fn entries_for_phase(
    meta: &MetaMap,
    phase: Phase,
    options: &Options,
    diag: &Diagnostics,
) -> Vec<RunListEntry> {
    let items = match get_list(meta, phase.name()) {
        Ok(items) => items,
        Err(LookupError::Missing(_)) => return Vec::new(),
        Err(err) => {
            diag.warn(err);
            return Vec::new();
        }
    };
    items
        .iter()
        .filter_map(|item| build_entry(item, phase, options, diag))
        .collect()
}

/// Build one entry from a pipeline item.
///
/// Items without a usable `run` field (such as leftover `kill` directives)
/// produce no entry.
pub fn build_entry(
    item: &MetaValue,
    phase: Phase,
    options: &Options,
    diag: &Diagnostics,
) -> Option<RunListEntry> {
    let map = item.as_map()?;
    let name = match get_text(map, RUN) {
        Ok(name) => name,
        Err(LookupError::Missing(_)) => return None,
        Err(err) => {
            diag.error(format!("{}---ignoring item", err));
            return None;
        }
    };
    let command = resolve_path(&name, phase.name(), options.support());
    let arguments = match map.get(ARGS) {
        Some(args) => parse_arguments(args, &name, diag),
        None => Vec::new(),
    };
    Some(RunListEntry::new(phase, command).with_arguments(arguments))
}

/// Arguments from an `args` field.
///
/// Text is split with shell quoting rules. A list is read as single-field
/// maps, one flag each, see [`flags_from_list`].
pub fn parse_arguments(args: &MetaValue, command: &str, diag: &Diagnostics) -> Vec<String> {
    if let Some(text) = args.to_plain_string() {
        return match shell_words::split(&text) {
            Ok(words) => words,
            Err(err) => {
                diag.error(format!(
                    "cannot read \"args\" of \"{}\": {}---ignoring them",
                    command, err
                ));
                Vec::new()
            }
        };
    }
    match args {
        MetaValue::List(items) => flags_from_list(items, diag),
        other => {
            diag.error(format!(
                "\"args\" of \"{}\" must be text or a MetaList, found \"{}\"---ignoring them",
                command,
                other.kind()
            ));
            Vec::new()
        }
    }
}

/// Long-option flags from a list of single-field maps.
///
/// `key: true` gives `--key`, `key: false` gives nothing, and text gives
/// `--key="value"`. Anything else is reported and dropped.
pub fn flags_from_list(items: &[MetaValue], diag: &Diagnostics) -> Vec<String> {
    let mut flags = Vec::new();
    for item in items {
        let Some(map) = item.as_map() else {
            diag.error("\"args\" list should have fields of type \"MetaMap\"");
            continue;
        };
        let mut fields = map.iter();
        let (Some((key, value)), None) = (fields.next(), fields.next()) else {
            diag.error("\"args\" list should have exactly one field per item");
            continue;
        };
        match value {
            MetaValue::Bool(true) => flags.push(format!("--{}", key)),
            MetaValue::Bool(false) => {}
            MetaValue::Inlines(_) | MetaValue::String(_) => {
                let text = value.to_plain_string().unwrap_or_default();
                flags.push(format!("--{}=\"{}\"", key, text));
            }
            other => diag.error(format!(
                "arguments of type \"{}\" not supported---\"{}\" ignored",
                other.kind(),
                key
            )),
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::set;

    fn item(run: &str, args: Option<MetaValue>) -> MetaValue {
        let mut map = MetaMap::new();
        set(&mut map, RUN, MetaValue::text(run));
        if let Some(args) = args {
            set(&mut map, ARGS, args);
        }
        MetaValue::Map(map)
    }

    fn flag(key: &str, value: MetaValue) -> MetaValue {
        let mut map = MetaMap::new();
        set(&mut map, key, value);
        MetaValue::Map(map)
    }

    fn options() -> Options {
        Options::new()
            .with_support("/nonexistent-support")
            .with_output("out.tex")
            .finalize()
    }

    #[test]
    fn test_shell_arguments() {
        let diag = Diagnostics::new();
        let args = MetaValue::text("--mode 'two words' -x");
        assert_eq!(
            parse_arguments(&args, "cmd", &diag),
            vec!["--mode", "two words", "-x"]
        );
    }

    #[test]
    fn test_unbalanced_quote_reported() {
        let diag = Diagnostics::new();
        let args = MetaValue::String("--mode 'oops".into());
        assert!(parse_arguments(&args, "cmd", &diag).is_empty());
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn test_structured_flags() {
        let diag = Diagnostics::new();
        let items = vec![
            flag("verbose", MetaValue::Bool(true)),
            flag("quiet", MetaValue::Bool(false)),
            flag("engine", MetaValue::text("xelatex")),
            flag("nested", MetaValue::List(vec![])),
            MetaValue::text("stray"),
        ];
        assert_eq!(
            flags_from_list(&items, &diag),
            vec!["--verbose", "--engine=\"xelatex\""]
        );
        assert_eq!(diag.error_count(), 2);
    }

    #[test]
    fn test_filters_get_writer_first() {
        let diag = Diagnostics::new();
        let mut meta = MetaMap::new();
        set(
            &mut meta,
            "filter",
            MetaValue::List(vec![item("styled", Some(MetaValue::text("--x")))]),
        );
        let options = options().with_filter("cli-filter");

        let runlist = build_run_list(&meta, &options, &diag);
        let summary: Vec<_> = runlist
            .iter()
            .map(|e| (e.command.as_str(), e.arguments.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("cli-filter", vec!["latex".to_string()]),
                ("styled", vec!["latex".to_string(), "--x".to_string()]),
            ]
        );
    }

    #[test]
    fn test_phase_order() {
        let diag = Diagnostics::new();
        let mut meta = MetaMap::new();
        for (field, name) in [("cleanup", "c"), ("preflight", "p"), ("postflight", "f")] {
            set(&mut meta, field, MetaValue::List(vec![item(name, None)]));
        }
        let kinds: Vec<_> = build_run_list(&meta, &options(), &diag)
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![Phase::Preflight, Phase::Postflight, Phase::Cleanup]);
    }

    #[test]
    fn test_postprocess_skipped_for_binary_output() {
        let diag = Diagnostics::new();
        let mut meta = MetaMap::new();
        set(&mut meta, "postprocess", MetaValue::List(vec![item("tidy", None)]));

        let text = build_run_list(&meta, &options(), &diag);
        assert_eq!(text.len(), 1);

        for output in ["out.docx", "out.pdf"] {
            let binary = Options::new().with_output(output).finalize();
            assert!(build_run_list(&meta, &binary, &diag).is_empty());
        }
    }

    #[test]
    fn test_mistyped_phase_field_warns() {
        let diag = Diagnostics::new();
        let mut meta = MetaMap::new();
        set(&mut meta, "preflight", MetaValue::Bool(true));
        assert!(build_run_list(&meta, &options(), &diag).is_empty());
        assert_eq!(diag.warning_count(), 1);
    }
}
