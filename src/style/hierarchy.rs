//! Expansion of requested styles into the full inheritance hierarchy.

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::meta::{get_map, list_or_scalar, LookupError, MetaMap};

/// Field of a style definition naming its parent style(s).
const PARENT: &str = "parent";

/// Expand `styles` to include every transitive parent.
///
/// Parents always come before their children. Each style appears once, at
/// its first position, so expanding an already expanded list is a no-op.
/// Styles without a definition are reported and dropped. A style that is
/// its own ancestor is a fatal [`Error::StyleCycle`].
pub fn expand(styles: &[String], defs: &MetaMap, diag: &Diagnostics) -> Result<Vec<String>> {
    let mut expanded = Vec::new();
    let mut trail = Vec::new();
    for style in styles {
        visit(style, defs, diag, &mut trail, &mut expanded)?;
    }
    Ok(expanded)
}

fn visit(
    name: &str,
    defs: &MetaMap,
    diag: &Diagnostics,
    trail: &mut Vec<String>,
    expanded: &mut Vec<String>,
) -> Result<()> {
    if let Some(start) = trail.iter().position(|s| s == name) {
        let mut chain = trail[start..].to_vec();
        chain.push(name.to_string());
        return Err(Error::StyleCycle(chain));
    }

    let def = match get_map(defs, name) {
        Ok(def) => def,
        Err(LookupError::Missing(_)) => {
            diag.error(format!(
                "no style definition found for style \"{}\"---ignoring it",
                name
            ));
            return Ok(());
        }
        Err(err) => {
            diag.error(format!("{}---ignoring style \"{}\"", err, name));
            return Ok(());
        }
    };

    trail.push(name.to_string());
    match list_or_scalar(def, PARENT) {
        Ok(parents) => {
            for parent in &parents {
                visit(parent, defs, diag, trail, expanded)?;
            }
        }
        Err(LookupError::Missing(_)) => {}
        Err(err) => diag.warn(format!("style \"{}\": {}", name, err)),
    }
    trail.pop();

    if !expanded.iter().any(|s| s == name) {
        expanded.push(name.to_string());
    }
    Ok(())
}

/// Requested styles that have no definition.
pub fn missing_styles(styles: &[String], defs: &MetaMap) -> Vec<String> {
    styles
        .iter()
        .filter(|style| !defs.contains_key(style.as_str()))
        .cloned()
        .collect()
}
