//! Container for the engine's JSON document tree.
//!
//! Only the metadata branch is interpreted. Block content is carried through
//! untouched and written back in whichever layout it was read in:
//!
//! - legacy: `[{"unMeta": {...}}, [blocks]]`
//! - current: `{"pandoc-api-version": [...], "meta": {...}, "blocks": [...]}`

use crate::error::{Error, Result};
use crate::meta::{map_from_json, map_to_json, MetaMap};
use serde_json::{json, Map, Value};

const LEGACY_META: &str = "unMeta";
const API_VERSION: &str = "pandoc-api-version";
const META: &str = "meta";
const BLOCKS: &str = "blocks";

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Legacy,
    Current { api_version: Value },
}

/// A parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    meta: MetaMap,
    blocks: Value,
    layout: Layout,
}

impl Default for Ast {
    fn default() -> Self {
        Self::empty()
    }
}

impl Ast {
    /// An empty document in the legacy layout.
    pub fn empty() -> Self {
        Self {
            meta: MetaMap::new(),
            blocks: Value::Array(Vec::new()),
            layout: Layout::Legacy,
        }
    }

    /// Parse a tree from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::BadAst(format!("document tree is not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    /// Interpret a JSON value as a tree.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(parts) => {
                let [meta, blocks] = parts.as_slice() else {
                    return Err(Error::BadAst(format!(
                        "expected metadata and blocks, found {} elements",
                        parts.len()
                    )));
                };
                let meta = meta
                    .get(LEGACY_META)
                    .and_then(Value::as_object)
                    .ok_or_else(|| Error::BadAst("metadata branch \"unMeta\" missing".into()))?;
                Ok(Self {
                    meta: map_from_json(meta)?,
                    blocks: blocks.clone(),
                    layout: Layout::Legacy,
                })
            }
            Value::Object(obj) => {
                let api_version = obj
                    .get(API_VERSION)
                    .cloned()
                    .ok_or_else(|| Error::BadAst("\"pandoc-api-version\" missing".into()))?;
                let meta = match obj.get(META) {
                    Some(Value::Object(meta)) => map_from_json(meta)?,
                    Some(_) => return Err(Error::BadAst("\"meta\" is not an object".into())),
                    None => MetaMap::new(),
                };
                Ok(Self {
                    meta,
                    blocks: obj.get(BLOCKS).cloned().unwrap_or_else(|| json!([])),
                    layout: Layout::Current { api_version },
                })
            }
            _ => Err(Error::BadAst("document tree is neither an array nor an object".into())),
        }
    }

    pub fn metadata(&self) -> &MetaMap {
        &self.meta
    }

    pub fn metadata_mut(&mut self) -> &mut MetaMap {
        &mut self.meta
    }

    /// Replace the metadata branch.
    pub fn set_metadata(&mut self, meta: MetaMap) {
        self.meta = meta;
    }

    /// Block content, as read.
    pub fn blocks(&self) -> &Value {
        &self.blocks
    }

    /// Encode the tree in its original layout.
    pub fn to_json(&self) -> Value {
        let meta = map_to_json(&self.meta);
        match &self.layout {
            Layout::Legacy => json!([{ LEGACY_META: meta }, self.blocks]),
            Layout::Current { api_version } => {
                let mut obj = Map::new();
                obj.insert(API_VERSION.to_string(), api_version.clone());
                obj.insert(META.to_string(), meta);
                obj.insert(BLOCKS.to_string(), self.blocks.clone());
                Value::Object(obj)
            }
        }
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}
