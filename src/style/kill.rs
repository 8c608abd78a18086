//! `run` / `kill` / `killall` directives inside additive lists.

use crate::diagnostics::Diagnostics;
use crate::meta::{get_bool, get_text, MetaMap, MetaValue};
use crate::runlist::Phase;

/// Directive adding a command to the list.
pub const RUN: &str = "run";

/// Directive removing earlier entries running the named command.
pub const KILL: &str = "kill";

/// Directive clearing every earlier entry.
pub const KILLALL: &str = "killall";

const DIRECTIVES: [&str; 3] = [RUN, KILL, KILLALL];

enum Directive {
    Run(String),
    Kill(String),
    KillAll(bool),
}

/// Apply the directives of `items` in a single left-to-right pass.
///
/// Only `run` items survive. A `kill` removes matching `run` items that came
/// before it, and `killall: true` removes everything that came before it.
/// Malformed items are reported and dropped.
pub fn apply_kill_rules(items: Vec<MetaValue>, diag: &Diagnostics) -> Vec<MetaValue> {
    let mut kept: Vec<(String, MetaValue)> = Vec::new();
    for item in items {
        let Some(directive) = parse_directive(&item, diag) else {
            continue;
        };
        match directive {
            Directive::Run(command) => kept.push((command, item)),
            Directive::Kill(target) => kept.retain(|(command, _)| *command != target),
            Directive::KillAll(true) => kept.clear(),
            Directive::KillAll(false) => {}
        }
    }
    kept.into_iter().map(|(_, item)| item).collect()
}

/// Apply kill rules to every additive field of `meta`.
///
/// A field left empty is removed, as is a field that is not a list.
pub fn apply_kill_rules_to_metadata(meta: &mut MetaMap, diag: &Diagnostics) {
    for phase in Phase::ALL {
        let field = phase.name();
        let items = match meta.remove(field) {
            None => continue,
            Some(MetaValue::List(items)) => items,
            Some(other) => {
                diag.warn(format!(
                    "value of \"{}\": expecting type \"MetaList\", but found type \"{}\"---ignoring it",
                    field,
                    other.kind()
                ));
                continue;
            }
        };
        let items = apply_kill_rules(items, diag);
        if !items.is_empty() {
            meta.insert(field.to_string(), MetaValue::List(items));
        }
    }
}

fn parse_directive(item: &MetaValue, diag: &Diagnostics) -> Option<Directive> {
    let Some(map) = item.as_map() else {
        diag.error(format!(
            "pipeline item must be a MetaMap, found \"{}\"---ignoring it",
            item.kind()
        ));
        return None;
    };

    let present: Vec<&str> = DIRECTIVES
        .into_iter()
        .filter(|key| map.contains_key(*key))
        .collect();
    let [key] = present.as_slice() else {
        diag.error(format!(
            "pipeline item must contain exactly one of \"run\", \"kill\" or \"killall\", found {}---ignoring it",
            present.len()
        ));
        return None;
    };

    let directive = match *key {
        RUN => get_text(map, RUN).map(Directive::Run),
        KILL => get_text(map, KILL).map(Directive::Kill),
        _ => get_bool(map, KILLALL).map(Directive::KillAll),
    };
    match directive {
        Ok(directive) => Some(directive),
        Err(err) => {
            diag.error(format!("{}---ignoring item", err));
            None
        }
    }
}
