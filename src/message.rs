//! The control message passed to scripts.
//!
//! Scripts read a JSON array holding one object that describes the resolved
//! run. The same text is stored in the document under [`RESERVED_FIELD`] as a
//! code block, so anything that sees the document can recover it.

use crate::error::{Error, Result};
use crate::meta::{MetaMap, MetaValue};
use crate::options::Options;
use crate::runlist::RunList;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Metadata field carrying the serialized control message.
pub const RESERVED_FIELD: &str = "panstyle_reserved";

/// Resolved state of a run, as seen by scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Document metadata, without the reserved field
    pub metadata: MetaMap,

    /// Resolved template path
    pub template: Option<String>,

    /// Requested styles that have a definition
    pub style: Vec<String>,

    /// Requested styles with all their ancestors, parents first
    pub stylefull: Vec<String>,

    /// Style definitions used by the document
    pub styledef: MetaMap,

    /// Every run-list entry, in execution order
    pub runlist: RunList,

    pub options: Options,
}

impl ControlMessage {
    /// Serialize as the one-element array scripts expect.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&(self,))?)
    }

    /// Parse the one-element array form.
    pub fn parse(text: &str) -> Result<Self> {
        let (message,): (ControlMessage,) = serde_json::from_str(text)?;
        Ok(message)
    }

    /// Encode as the value of [`RESERVED_FIELD`].
    pub fn to_reserved(&self) -> Result<MetaValue> {
        let text = self.to_json_string()?;
        Ok(MetaValue::Blocks(vec![json!({
            "t": "CodeBlock",
            "c": [["", [], []], text]
        })]))
    }

    /// Recover a message from the value of [`RESERVED_FIELD`].
    pub fn from_reserved(value: &MetaValue) -> Result<Self> {
        let MetaValue::Blocks(blocks) = value else {
            return Err(Error::BadAst(format!(
                "\"{}\" must be MetaBlocks, found {}",
                RESERVED_FIELD,
                value.kind()
            )));
        };
        let text = blocks
            .first()
            .filter(|block| block.get("t").and_then(Value::as_str) == Some("CodeBlock"))
            .and_then(|block| block.get("c"))
            .and_then(|c| c.get(1))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::BadAst(format!("\"{}\" holds no code block", RESERVED_FIELD)))?;
        Self::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runlist::{Phase, RunListEntry};

    fn sample() -> ControlMessage {
        let mut metadata = MetaMap::new();
        metadata.insert("title".into(), MetaValue::text("Report"));
        ControlMessage {
            metadata,
            template: Some("report.tex".into()),
            style: vec!["Report".into()],
            stylefull: vec!["Base".into(), "Report".into()],
            styledef: MetaMap::new(),
            runlist: vec![
                RunListEntry::new(Phase::Preflight, "/s/preflight/mkdir/mkdir.py"),
                RunListEntry::new(Phase::Filter, "smallcaps").with_arguments(vec![
                    "latex".into(),
                    "--mode=\"full\"".into(),
                ]),
            ],
            options: Options::new().with_output("out.tex").finalize(),
        }
    }

    #[test]
    fn test_array_shape() {
        let text = sample().to_json_string().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        for key in ["metadata", "template", "style", "stylefull", "styledef", "runlist", "options"] {
            assert!(items[0].get(key).is_some(), "missing {}", key);
        }
        assert_eq!(items[0]["options"]["pandoc"]["write"], "latex");
        assert_eq!(items[0]["metadata"]["title"]["t"], "MetaInlines");
    }

    #[test]
    fn test_parse_back() {
        let message = sample();
        let parsed = ControlMessage::parse(&message.to_json_string().unwrap()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_reserved_field_round_trip() {
        let message = sample();
        let reserved = message.to_reserved().unwrap();
        let MetaValue::Blocks(blocks) = &reserved else {
            panic!("expected blocks");
        };
        assert_eq!(blocks[0]["t"], "CodeBlock");
        assert_eq!(ControlMessage::from_reserved(&reserved).unwrap(), message);
    }

    #[test]
    fn test_reserved_field_wrong_type() {
        assert!(matches!(
            ControlMessage::from_reserved(&MetaValue::Bool(true)),
            Err(Error::BadAst(_))
        ));
    }
}
