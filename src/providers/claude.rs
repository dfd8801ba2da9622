//! Claude Code hook payload adapter.
//!
//! Claude Code hooks deliver JSON on stdin with `session_id`,
//! `transcript_path`, `cwd`, `tool_name`, and a per-tool `tool_input`
//! object. Edits arrive as `old_string`/`new_string` pairs (`Edit`), an
//! `edits` array (`MultiEdit`), or whole-file `content` (`Write`).

use std::path::PathBuf;

use serde_json::Value;
use uuid::Uuid;

use crate::position::EditRecord;
use crate::providers::{session_id_from_path, str_field, ToolEvent};

/// Extracts the session id, preferring the payload's own `session_id`.
pub(crate) fn session_id(payload: &Value) -> Uuid {
    if let Some(id) = str_field(payload, "session_id").and_then(|s| Uuid::parse_str(s).ok()) {
        return id;
    }
    str_field(payload, "transcript_path")
        .map(session_id_from_path)
        .unwrap_or_else(Uuid::nil)
}

/// Maps a Claude Code hook payload into the canonical tool event shape.
pub(crate) fn adapt(payload: &Value) -> Option<ToolEvent> {
    let tool_name = str_field(payload, "tool_name")?.to_string();
    let input = payload.get("tool_input");

    let tool_call_id = str_field(payload, "tool_use_id")
        .unwrap_or("unpaired")
        .to_string();

    let file_path = input
        .and_then(|i| str_field(i, "file_path"))
        .map(PathBuf::from);

    let edits = input.map(|input| extract_edits(&tool_name, input)).unwrap_or_default();

    let cwd = str_field(payload, "cwd").map(PathBuf::from);

    Some(ToolEvent {
        tool_name,
        tool_call_id,
        file_path,
        edits,
        cwd,
    })
}

/// Pulls edit records out of a tool's input object.
fn extract_edits(tool_name: &str, input: &Value) -> Vec<EditRecord> {
    match tool_name {
        "Edit" => single_edit(input).into_iter().collect(),
        "MultiEdit" => input
            .get("edits")
            .and_then(Value::as_array)
            .map(|edits| edits.iter().filter_map(single_edit).collect())
            .unwrap_or_default(),
        "Write" => str_field(input, "content")
            .map(|content| {
                vec![EditRecord {
                    old_string: String::new(),
                    new_string: content.to_string(),
                    range: None,
                }]
            })
            .unwrap_or_default(),
        // Other tools (Bash, Read, ...) report no structured edits; their
        // changes are attributed by the snapshot diff instead.
        _ => Vec::new(),
    }
}

/// Builds one edit record from an `old_string`/`new_string` pair.
fn single_edit(value: &Value) -> Option<EditRecord> {
    let old_string = str_field(value, "old_string")?;
    let new_string = str_field(value, "new_string")?;
    Some(EditRecord {
        old_string: old_string.to_string(),
        new_string: new_string.to_string(),
        range: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_tool_maps_to_single_edit() {
        let payload = json!({
            "session_id": "8f14e45f-ceea-4672-9b66-54b8c1b3e1a2",
            "tool_name": "Edit",
            "tool_use_id": "toolu_01",
            "cwd": "/tmp/project",
            "tool_input": {
                "file_path": "/tmp/project/src/main.rs",
                "old_string": "let x = 1;",
                "new_string": "let x = 2;",
            },
        });

        let event = adapt(&payload).unwrap();
        assert_eq!(event.tool_name, "Edit");
        assert_eq!(event.tool_call_id, "toolu_01");
        assert_eq!(event.file_path.as_deref().unwrap().to_str().unwrap(), "/tmp/project/src/main.rs");
        assert_eq!(event.edits.len(), 1);
        assert_eq!(event.edits[0].old_string, "let x = 1;");
        assert_eq!(event.cwd.as_deref().unwrap().to_str().unwrap(), "/tmp/project");
    }

    #[test]
    fn multi_edit_maps_each_entry() {
        let payload = json!({
            "tool_name": "MultiEdit",
            "tool_input": {
                "file_path": "/tmp/p/lib.rs",
                "edits": [
                    {"old_string": "a", "new_string": "b"},
                    {"old_string": "c", "new_string": "d"},
                    {"not_an_edit": true},
                ],
            },
        });

        let event = adapt(&payload).unwrap();
        assert_eq!(event.edits.len(), 2);
        assert_eq!(event.edits[1].new_string, "d");
    }

    #[test]
    fn write_tool_maps_content_to_whole_file_edit() {
        let payload = json!({
            "tool_name": "Write",
            "tool_input": {
                "file_path": "/tmp/p/new.rs",
                "content": "fn main() {}\n",
            },
        });

        let event = adapt(&payload).unwrap();
        assert_eq!(event.edits.len(), 1);
        assert_eq!(event.edits[0].old_string, "");
        assert_eq!(event.edits[0].new_string, "fn main() {}\n");
    }

    #[test]
    fn bash_tool_has_no_edits() {
        let payload = json!({
            "tool_name": "Bash",
            "tool_input": {"command": "cargo fmt"},
        });

        let event = adapt(&payload).unwrap();
        assert!(event.edits.is_empty());
        assert!(event.file_path.is_none());
    }

    #[test]
    fn payload_without_tool_name_is_rejected() {
        assert!(adapt(&json!({"hook_event_name": "Stop"})).is_none());
    }

    #[test]
    fn session_id_prefers_payload_field() {
        let payload = json!({
            "session_id": "8f14e45f-ceea-4672-9b66-54b8c1b3e1a2",
            "transcript_path": "/tmp/t.jsonl",
        });
        assert_eq!(
            session_id(&payload),
            Uuid::parse_str("8f14e45f-ceea-4672-9b66-54b8c1b3e1a2").unwrap()
        );
    }

    #[test]
    fn session_id_falls_back_to_transcript_path() {
        let payload = json!({"transcript_path": "/tmp/t.jsonl"});
        let id = session_id(&payload);
        assert_ne!(id, Uuid::nil());
        assert_eq!(id, session_id(&payload)); // deterministic
    }

    #[test]
    fn session_id_without_any_hint_is_nil() {
        assert_eq!(session_id(&json!({})), Uuid::nil());
    }

    #[test]
    fn missing_tool_use_id_marks_event_unpaired() {
        let payload = json!({"tool_name": "Edit", "tool_input": {}});
        assert_eq!(adapt(&payload).unwrap().tool_call_id, "unpaired");
    }
}
