//! Integration tests for the control message carried inside the document.

use panstyle::message::RESERVED_FIELD;
use panstyle::{Ast, ControlMessage, Document, Options, Phase, RunListEntry, Status};
use serde_json::json;

fn document(tree: serde_json::Value) -> Document {
    let mut doc = Document::new(
        Options::new()
            .with_input(["a.md"])
            .with_output("a.tex")
            .with_filter("num.py")
            .finalize(),
    );
    doc.ast = Ast::from_json(&tree).unwrap();
    doc.style = vec!["Paper".into()];
    doc.stylefull = vec!["Base".into(), "Paper".into()];
    doc.runlist = vec![
        RunListEntry::new(Phase::Filter, "num.py").with_arguments(vec!["latex".into()]),
        RunListEntry::new(Phase::Postflight, "/s/postflight/latexmk.py"),
    ];
    doc.runlist[1].advance(Status::Running).unwrap();
    doc
}

#[test]
fn test_message_survives_tree_serialization() {
    for tree in [
        json!([{"unMeta": {}}, []]),
        json!({"pandoc-api-version": [1, 23, 1], "meta": {}, "blocks": []}),
    ] {
        let mut doc = document(tree);
        let text = doc.inject_control_message().unwrap();

        let reparsed = Ast::parse(&doc.ast.to_json_string()).unwrap();
        let embedded = ControlMessage::from_reserved(&reparsed.metadata()[RESERVED_FIELD]).unwrap();
        assert_eq!(embedded, ControlMessage::parse(&text).unwrap());

        assert_eq!(embedded.runlist, doc.runlist);
        assert_eq!(embedded.runlist[0].kind, Phase::Filter);
        assert_eq!(embedded.runlist[0].arguments, vec!["latex".to_string()]);
        assert_eq!(embedded.runlist[1].status(), Status::Running);
        assert_eq!(embedded.stylefull, vec!["Base", "Paper"]);
        assert_eq!(embedded.options, doc.options);
    }
}

#[test]
fn test_message_wire_shape() {
    let mut doc = document(json!([{"unMeta": {}}, []]));
    let text = doc.inject_control_message().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let message = &items[0];
    for key in ["metadata", "template", "style", "stylefull", "styledef", "runlist", "options"] {
        assert!(message.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(message["options"]["pandoc"]["write"], "latex");
    assert_eq!(message["options"]["pandoc"]["pdf_output"], false);
    assert_eq!(message["options"]["pandoc"]["filter"], json!(["num.py"]));
    assert_eq!(message["runlist"][0]["kind"], "filter");
    assert_eq!(message["runlist"][0]["status"], "queued");
    assert_eq!(message["runlist"][1]["command"], "/s/postflight/latexmk.py");
}

#[test]
fn test_scripts_may_omit_status() {
    let text = r#"[{
        "metadata": {},
        "template": null,
        "style": [],
        "stylefull": [],
        "styledef": {},
        "runlist": [{"kind": "cleanup", "command": "rm-aux", "arguments": ["-f"]}],
        "options": {
            "panstyle": {"support": "/s", "strict": false, "debug": null, "stdin_temp_file": null},
            "pandoc": {"input": [], "output": "-", "pdf_output": false, "read": null,
                       "write": "html", "template": null, "filter": [], "options": []}
        }
    }]"#;
    let message = ControlMessage::parse(text).unwrap();
    assert_eq!(message.runlist[0].kind, Phase::Cleanup);
    assert_eq!(message.runlist[0].status(), Status::Queued);
}
