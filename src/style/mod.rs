//! Style resolution: hierarchy expansion, metadata merging and kill rules.

mod hierarchy;
mod kill;
mod merge;

pub use hierarchy::{expand, missing_styles};
pub use kill::{apply_kill_rules, apply_kill_rules_to_metadata, KILL, KILLALL, RUN};
pub use merge::{merge, resolve, style_layers, ALL_WRITERS, GLOBAL_STYLE, METADATA_FIELD};
