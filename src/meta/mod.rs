//! Typed metadata model.
//!
//! Metadata in the engine's document tree is a tree of tagged nodes
//! (`{"t": "MetaMap", "c": {...}}`). This module parses those nodes into the
//! closed [`MetaValue`] sum type and provides total lookup functions over it.

mod access;
mod inline;
mod value;

pub use access::{
    get, get_bool, get_list, get_map, get_nested, get_text, get_typed, list_or_scalar,
    nested_map, set, LookupError,
};
pub use inline::{inlines_from_str, stringify};
pub use value::{map_from_json, map_to_json, MetaKind, MetaMap, MetaValue, CONTENT, TAG};
