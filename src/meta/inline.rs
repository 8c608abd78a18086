//! Conversion between inline node trees and plain strings.

use serde_json::{json, Value};

/// Flatten inline nodes into plain text.
///
/// `Str` contributes its text, whitespace nodes become a single space, and
/// code or math contributes its source. Every other node is searched for
/// nested inlines.
pub fn stringify(nodes: &[Value]) -> String {
    let mut out = String::new();
    for node in nodes {
        walk(node, &mut out);
    }
    out
}

fn walk(node: &Value, out: &mut String) {
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        Value::Object(obj) => {
            let tag = obj.get("t").and_then(Value::as_str).unwrap_or_default();
            let content = obj.get("c");
            match tag {
                "Str" | "MetaString" => {
                    if let Some(text) = content.and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                "Space" | "SoftBreak" | "LineBreak" => out.push(' '),
                // [attr, text] and [mathtype, text]
                "Code" | "Math" | "RawInline" => {
                    if let Some(text) = content.and_then(|c| c.get(1)).and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                _ => {
                    if let Some(content) = content {
                        walk(content, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Build inline nodes for a plain string, splitting on whitespace.
pub fn inlines_from_str(s: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    for (i, word) in s.split_whitespace().enumerate() {
        if i > 0 {
            nodes.push(json!({"t": "Space"}));
        }
        nodes.push(json!({"t": "Str", "c": word}));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_words() {
        let nodes = vec![
            json!({"t": "Str", "c": "hello"}),
            json!({"t": "Space"}),
            json!({"t": "Str", "c": "world"}),
        ];
        assert_eq!(stringify(&nodes), "hello world");
    }

    #[test]
    fn test_stringify_code() {
        let nodes = vec![json!({"t": "Code", "c": [["", [], []], "--number-sections"]})];
        assert_eq!(stringify(&nodes), "--number-sections");
    }

    #[test]
    fn test_stringify_nested_emphasis() {
        let nodes = vec![
            json!({"t": "Emph", "c": [{"t": "Str", "c": "a"}, {"t": "SoftBreak"}, {"t": "Str", "c": "b"}]}),
            json!({"t": "Str", "c": ".py"}),
        ];
        assert_eq!(stringify(&nodes), "a b.py");
    }

    #[test]
    fn test_inlines_round_trip() {
        let nodes = inlines_from_str("run  this\tnow");
        assert_eq!(nodes.len(), 5);
        assert_eq!(stringify(&nodes), "run this now");
        assert!(inlines_from_str("").is_empty());
    }
}
