//! Command path resolution.

use std::path::{Path, PathBuf};

/// Resolve a file name of `kind` (a phase name, or `template`) against the
/// working directory and the support directory.
///
/// Candidates, first existing file wins:
///
/// 1. `name` as given
/// 2. `<kind>/<name>`
/// 3. `<kind>/<stem>/<name>`
/// 4. `<support>/<kind>/<name>`
/// 5. `<support>/<kind>/<stem>/<name>`
///
/// With no match, `name` is returned unchanged for lookup on `PATH`.
pub fn resolve_path(name: &str, kind: &str, support: &Path) -> String {
    candidates(name, kind, support)
        .into_iter()
        .find(|path| path.is_file())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn candidates(name: &str, kind: &str, support: &Path) -> Vec<PathBuf> {
    let stem = Path::new(name)
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_default();
    let local = Path::new(kind);
    let shared = support.join(kind);
    vec![
        PathBuf::from(name),
        local.join(name),
        local.join(&stem).join(name),
        shared.join(name),
        shared.join(&stem).join(name),
    ]
}
