//! Layered metadata merging.
//!
//! Layers are applied lowest priority first:
//!
//! 1. `Global` style, all writers
//! 2. `Global` style, current writer
//! 3. each style of the expanded hierarchy (parents first): all writers,
//!    then current writer
//! 4. the document's own metadata
//!
//! Scalar and map fields from later layers replace earlier ones; the additive
//! pipeline fields are concatenated instead, and `commandline` maps are
//! merged key by key.

use crate::commandline::merge_commandline;
use crate::diagnostics::Diagnostics;
use crate::meta::{nested_map, LookupError, MetaKind, MetaMap, MetaValue};
use crate::runlist::Phase;

/// Pseudo-style applied to every document before any requested style.
pub const GLOBAL_STYLE: &str = "Global";

/// Branch of a style definition that applies regardless of writer.
pub const ALL_WRITERS: &str = "all-writers";

/// Field whose contents are lifted to the top level when merging.
pub const METADATA_FIELD: &str = "metadata";

/// Merge `new` on top of `old`.
///
/// 1. The contents of a `metadata` map in `new` are copied into `old`.
/// 2. The entries of a `commandline` map in `new` replace those in `old`.
/// 3. Additive fields are concatenated, `old` first. A type mismatch on
///    either side leaves that field as it was in `old`.
/// 4. Every other field of `new` replaces the field in `old`.
pub fn merge(mut old: MetaMap, mut new: MetaMap, diag: &Diagnostics) -> MetaMap {
    match new.remove(METADATA_FIELD) {
        Some(MetaValue::Map(inner)) => old.extend(inner),
        Some(other) => {
            diag.warn(wrong_type(METADATA_FIELD, MetaKind::Map, &other));
            new.insert(METADATA_FIELD.to_string(), other);
        }
        None => {}
    }
    merge_commandline(&mut old, &mut new, diag);

    for phase in Phase::ALL {
        let field = phase.name();
        let Some(incoming) = new.remove(field) else {
            continue;
        };
        let incoming = match incoming {
            MetaValue::List(items) => items,
            other => {
                diag.warn(wrong_type(field, MetaKind::List, &other));
                continue;
            }
        };
        match old.get_mut(field) {
            None => {
                old.insert(field.to_string(), MetaValue::List(incoming));
            }
            Some(MetaValue::List(existing)) => existing.extend(incoming),
            Some(other) => diag.warn(wrong_type(field, MetaKind::List, other)),
        }
    }

    old.extend(new);
    old
}

/// The style layers for `writer`, lowest priority first.
pub fn style_layers(
    styledef: &MetaMap,
    stylefull: &[String],
    writer: &str,
    diag: &Diagnostics,
) -> Vec<MetaMap> {
    let mut layers = vec![
        nested_map(styledef, &[GLOBAL_STYLE, ALL_WRITERS], diag),
        nested_map(styledef, &[GLOBAL_STYLE, writer], diag),
    ];
    for style in stylefull.iter().filter(|s| s.as_str() != GLOBAL_STYLE) {
        layers.push(nested_map(styledef, &[style.as_str(), ALL_WRITERS], diag));
        layers.push(nested_map(styledef, &[style.as_str(), writer], diag));
    }
    layers
}

/// Resolve the final metadata of a document.
pub fn resolve(
    document: &MetaMap,
    styledef: &MetaMap,
    stylefull: &[String],
    writer: &str,
    diag: &Diagnostics,
) -> MetaMap {
    let merged = style_layers(styledef, stylefull, writer, diag)
        .into_iter()
        .fold(MetaMap::new(), |acc, layer| merge(acc, layer, diag));
    merge(merged, document.clone(), diag)
}

fn wrong_type(field: &str, expected: MetaKind, found: &MetaValue) -> LookupError {
    LookupError::WrongType {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{get_list, get_text, set};

    fn run(name: &str) -> MetaValue {
        let mut item = MetaMap::new();
        set(&mut item, "run", MetaValue::text(name));
        MetaValue::Map(item)
    }

    fn runs(names: &[&str]) -> MetaValue {
        MetaValue::List(names.iter().map(|n| run(n)).collect())
    }

    fn run_names(map: &MetaMap, field: &str) -> Vec<String> {
        get_list(map, field)
            .unwrap()
            .iter()
            .map(|item| get_text(item.as_map().unwrap(), "run").unwrap())
            .collect()
    }

    #[test]
    fn test_scalars_overwrite() {
        let diag = Diagnostics::new();
        let mut old = MetaMap::new();
        set(&mut old, "template", MetaValue::text("old.tex"));
        set(&mut old, "title", MetaValue::text("Kept"));
        let mut new = MetaMap::new();
        set(&mut new, "template", MetaValue::text("new.tex"));

        let merged = merge(old, new, &diag);
        assert_eq!(get_text(&merged, "template").unwrap(), "new.tex");
        assert_eq!(get_text(&merged, "title").unwrap(), "Kept");
    }

    #[test]
    fn test_additive_fields_concatenate() {
        let diag = Diagnostics::new();
        let mut a = MetaMap::new();
        set(&mut a, "filter", runs(&["A1", "A2"]));
        set(&mut a, "cleanup", runs(&["C"]));
        let mut b = MetaMap::new();
        set(&mut b, "filter", runs(&["B1"]));
        set(&mut b, "postflight", runs(&["P"]));

        let merged = merge(merge(MetaMap::new(), a, &diag), b, &diag);
        assert_eq!(run_names(&merged, "filter"), vec!["A1", "A2", "B1"]);
        assert_eq!(run_names(&merged, "cleanup"), vec!["C"]);
        assert_eq!(run_names(&merged, "postflight"), vec!["P"]);
    }

    #[test]
    fn test_metadata_field_lifted() {
        let diag = Diagnostics::new();
        let mut inner = MetaMap::new();
        set(&mut inner, "author", MetaValue::text("Someone"));
        let mut new = MetaMap::new();
        set(&mut new, METADATA_FIELD, MetaValue::Map(inner));

        let merged = merge(MetaMap::new(), new, &diag);
        assert_eq!(get_text(&merged, "author").unwrap(), "Someone");
        assert!(!merged.contains_key(METADATA_FIELD));
    }

    #[test]
    fn test_type_mismatch_only_skips_field() {
        let diag = Diagnostics::new();
        let mut old = MetaMap::new();
        set(&mut old, "filter", runs(&["A"]));
        set(&mut old, "preflight", MetaValue::Bool(true));
        let mut new = MetaMap::new();
        set(&mut new, "filter", MetaValue::text("oops"));
        set(&mut new, "preflight", runs(&["P"]));
        set(&mut new, "cleanup", runs(&["C"]));

        let merged = merge(old, new, &diag);
        assert_eq!(run_names(&merged, "filter"), vec!["A"]);
        assert_eq!(merged["preflight"], MetaValue::Bool(true));
        assert_eq!(run_names(&merged, "cleanup"), vec!["C"]);
        assert_eq!(diag.warning_count(), 2);
    }

    #[test]
    fn test_layer_precedence() {
        let diag = Diagnostics::new();
        let mut styledef = MetaMap::new();

        let layer = |template: &str, filter: &str| {
            let mut map = MetaMap::new();
            set(&mut map, "template", MetaValue::text(template));
            set(&mut map, "filter", runs(&[filter]));
            MetaValue::Map(map)
        };

        let mut global = MetaMap::new();
        set(&mut global, ALL_WRITERS, layer("g-all", "g1"));
        set(&mut global, "latex", layer("g-latex", "g2"));
        set(&mut styledef, GLOBAL_STYLE, MetaValue::Map(global));

        let mut base = MetaMap::new();
        set(&mut base, ALL_WRITERS, layer("base-all", "b1"));
        set(&mut base, "latex", layer("base-latex", "b2"));
        set(&mut base, "html", layer("base-html", "never"));
        set(&mut styledef, "base", MetaValue::Map(base));

        let mut document = MetaMap::new();
        set(&mut document, "filter", runs(&["doc"]));

        let merged = resolve(&document, &styledef, &["base".to_string()], "latex", &diag);
        assert_eq!(run_names(&merged, "filter"), vec!["g1", "g2", "b1", "b2", "doc"]);
        assert_eq!(get_text(&merged, "template").unwrap(), "base-latex");
    }

    #[test]
    fn test_commandline_entries_accumulate_across_layers() {
        let diag = Diagnostics::new();
        let options = |entries: &[(&str, bool)]| {
            let mut inner = MetaMap::new();
            for (name, on) in entries {
                set(&mut inner, *name, MetaValue::Bool(*on));
            }
            let mut map = MetaMap::new();
            set(&mut map, "commandline", MetaValue::Map(inner));
            map
        };

        let merged = merge(
            merge(options(&[("toc", true), ("listings", true)]), options(&[("listings", false)]), &diag),
            options(&[("standalone", true)]),
            &diag,
        );
        let commandline = merged["commandline"].as_map().unwrap();
        assert_eq!(commandline.len(), 3);
        assert_eq!(commandline["toc"], MetaValue::Bool(true));
        assert_eq!(commandline["listings"], MetaValue::Bool(false));
        assert_eq!(commandline["standalone"], MetaValue::Bool(true));
    }

    #[test]
    fn test_document_metadata_wins() {
        let diag = Diagnostics::new();
        let mut style = MetaMap::new();
        let mut all = MetaMap::new();
        set(&mut all, "title", MetaValue::text("From style"));
        set(&mut style, ALL_WRITERS, MetaValue::Map(all));
        let mut styledef = MetaMap::new();
        set(&mut styledef, "s", MetaValue::Map(style));

        let mut document = MetaMap::new();
        set(&mut document, "title", MetaValue::text("From document"));

        let merged = resolve(&document, &styledef, &["s".to_string()], "html", &diag);
        assert_eq!(get_text(&merged, "title").unwrap(), "From document");
    }
}
