//! Metadata value types and their wire encoding.

use super::inline::{inlines_from_str, stringify};
use crate::error::{Error, Result};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Key holding a node's type tag on the wire.
pub const TAG: &str = "t";

/// Key holding a node's payload on the wire.
pub const CONTENT: &str = "c";

/// A metadata map. Key order carries no meaning.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// A metadata node.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Nested map (`MetaMap`)
    Map(MetaMap),
    /// Ordered list (`MetaList`)
    List(Vec<MetaValue>),
    /// Formatted inline text (`MetaInlines`), kept as raw inline nodes
    Inlines(Vec<Value>),
    /// Plain string (`MetaString`)
    String(String),
    /// Boolean (`MetaBool`)
    Bool(bool),
    /// Block content (`MetaBlocks`), kept as raw block nodes
    Blocks(Vec<Value>),
}

/// Discriminant of a [`MetaValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Map,
    List,
    Inlines,
    String,
    Bool,
    Blocks,
}

impl MetaKind {
    /// Tag name used on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            MetaKind::Map => "MetaMap",
            MetaKind::List => "MetaList",
            MetaKind::Inlines => "MetaInlines",
            MetaKind::String => "MetaString",
            MetaKind::Bool => "MetaBool",
            MetaKind::Blocks => "MetaBlocks",
        }
    }

    /// Look up a kind by its wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "MetaMap" => Some(MetaKind::Map),
            "MetaList" => Some(MetaKind::List),
            "MetaInlines" => Some(MetaKind::Inlines),
            "MetaString" => Some(MetaKind::String),
            "MetaBool" => Some(MetaKind::Bool),
            "MetaBlocks" => Some(MetaKind::Blocks),
            _ => None,
        }
    }
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl MetaValue {
    /// Build an inline text value from a plain string.
    pub fn text(s: &str) -> Self {
        MetaValue::Inlines(inlines_from_str(s))
    }

    /// The discriminant of this value.
    pub fn kind(&self) -> MetaKind {
        match self {
            MetaValue::Map(_) => MetaKind::Map,
            MetaValue::List(_) => MetaKind::List,
            MetaValue::Inlines(_) => MetaKind::Inlines,
            MetaValue::String(_) => MetaKind::String,
            MetaValue::Bool(_) => MetaKind::Bool,
            MetaValue::Blocks(_) => MetaKind::Blocks,
        }
    }

    /// Plain text of an `Inlines` or `String` value.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            MetaValue::Inlines(nodes) => Some(stringify(nodes)),
            MetaValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetaMap> {
        match self {
            MetaValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a node from its wire encoding.
    ///
    /// Bare JSON strings and booleans are accepted as `String` and `Bool`.
    /// An object missing its tag or content, or carrying an unknown tag, is
    /// rejected with [`Error::BadAst`].
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::String(s) => return Ok(MetaValue::String(s.clone())),
            Value::Bool(b) => return Ok(MetaValue::Bool(*b)),
            other => {
                return Err(Error::BadAst(format!(
                    "value of \"{}\" corrupt: not a metadata node",
                    other
                )))
            }
        };
        let tag = obj
            .get(TAG)
            .ok_or_else(|| corrupt(value, TAG))?
            .as_str()
            .ok_or_else(|| Error::BadAst(format!("value of \"{}\" corrupt: tag is not a string", value)))?;
        let content = obj.get(CONTENT).ok_or_else(|| corrupt(value, CONTENT))?;
        let kind = MetaKind::from_tag(tag)
            .ok_or_else(|| Error::BadAst(format!("unknown metadata tag \"{}\"", tag)))?;

        let bad_payload = || {
            Error::BadAst(format!(
                "value of \"{}\" corrupt: payload does not match tag \"{}\"",
                value, tag
            ))
        };

        Ok(match kind {
            MetaKind::Map => {
                MetaValue::Map(map_from_json(content.as_object().ok_or_else(bad_payload)?)?)
            }
            MetaKind::List => MetaValue::List(
                content
                    .as_array()
                    .ok_or_else(bad_payload)?
                    .iter()
                    .map(MetaValue::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            MetaKind::Inlines => {
                MetaValue::Inlines(content.as_array().ok_or_else(bad_payload)?.clone())
            }
            MetaKind::String => {
                MetaValue::String(content.as_str().ok_or_else(bad_payload)?.to_string())
            }
            MetaKind::Bool => MetaValue::Bool(content.as_bool().ok_or_else(bad_payload)?),
            MetaKind::Blocks => {
                MetaValue::Blocks(content.as_array().ok_or_else(bad_payload)?.clone())
            }
        })
    }

    /// Encode this node for the wire.
    pub fn to_json(&self) -> Value {
        let content = match self {
            MetaValue::Map(map) => map_to_json(map),
            MetaValue::List(items) => Value::Array(items.iter().map(MetaValue::to_json).collect()),
            MetaValue::Inlines(nodes) | MetaValue::Blocks(nodes) => Value::Array(nodes.clone()),
            MetaValue::String(s) => Value::String(s.clone()),
            MetaValue::Bool(b) => Value::Bool(*b),
        };
        let mut obj = Map::new();
        obj.insert(TAG.to_string(), Value::String(self.kind().tag().to_string()));
        obj.insert(CONTENT.to_string(), content);
        Value::Object(obj)
    }
}

fn corrupt(value: &Value, key: &str) -> Error {
    Error::BadAst(format!(
        "value of \"{}\" corrupt: \"{}\" field missing",
        value,
        key.to_uppercase()
    ))
}

/// Parse the payload of a `MetaMap` (or a document's metadata branch).
pub fn map_from_json(obj: &Map<String, Value>) -> Result<MetaMap> {
    obj.iter()
        .map(|(key, value)| Ok((key.clone(), MetaValue::from_json(value)?)))
        .collect()
}

/// Encode a map as the payload of a `MetaMap`.
pub fn map_to_json(map: &MetaMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MetaValue::from_json(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_map() {
        let raw = json!({
            "t": "MetaMap",
            "c": {
                "flag": {"t": "MetaBool", "c": true},
                "name": {"t": "MetaInlines", "c": [{"t": "Str", "c": "hello"}]},
                "items": {"t": "MetaList", "c": [{"t": "MetaString", "c": "x"}]}
            }
        });
        let value = MetaValue::from_json(&raw).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["flag"], MetaValue::Bool(true));
        assert_eq!(map["name"].to_plain_string().as_deref(), Some("hello"));
        assert_eq!(map["items"].as_list().unwrap().len(), 1);
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn test_missing_content_rejected() {
        let raw = json!({"t": "MetaBool"});
        let err = MetaValue::from_json(&raw).unwrap_err();
        assert!(matches!(err, Error::BadAst(_)));
        assert!(err.to_string().contains("\"C\" field missing"));
    }

    #[test]
    fn test_missing_tag_rejected() {
        let raw = json!({"c": true});
        assert!(matches!(MetaValue::from_json(&raw), Err(Error::BadAst(_))));
    }

    #[test]
    fn test_nested_corruption_rejected() {
        let raw = json!({"t": "MetaList", "c": [{"t": "MetaInlines"}]});
        assert!(matches!(MetaValue::from_json(&raw), Err(Error::BadAst(_))));
    }

    #[test]
    fn test_payload_mismatch_rejected() {
        let raw = json!({"t": "MetaBool", "c": "yes"});
        assert!(matches!(MetaValue::from_json(&raw), Err(Error::BadAst(_))));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let raw = json!({"t": "MetaNumber", "c": 3});
        assert!(matches!(MetaValue::from_json(&raw), Err(Error::BadAst(_))));
    }

    #[test]
    fn test_bare_scalars_accepted() {
        assert_eq!(
            MetaValue::from_json(&json!("plain")).unwrap(),
            MetaValue::String("plain".into())
        );
        assert_eq!(MetaValue::from_json(&json!(false)).unwrap(), MetaValue::Bool(false));
        assert!(MetaValue::from_json(&json!(12)).is_err());
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        let value = MetaValue::List(vec![MetaValue::Bool(true)]);
        let text = serde_json::to_string(&value).unwrap();
        let raw: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw, json!({"t": "MetaList", "c": [{"t": "MetaBool", "c": true}]}));
        let back: MetaValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_kind_tags() {
        for kind in [
            MetaKind::Map,
            MetaKind::List,
            MetaKind::Inlines,
            MetaKind::String,
            MetaKind::Bool,
            MetaKind::Blocks,
        ] {
            assert_eq!(MetaKind::from_tag(kind.tag()), Some(kind));
        }
    }
}
