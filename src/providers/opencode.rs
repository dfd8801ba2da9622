//! OpenCode hook payload adapter.
//!
//! OpenCode payloads carry `sessionID`, `tool`, `callID` and an `args`
//! object with `filePath`/`oldString`/`newString` fields (whole-file writes
//! use `content`).

use std::path::PathBuf;

use serde_json::Value;
use uuid::Uuid;

use crate::position::EditRecord;
use crate::providers::{session_id_from_path, str_field, ToolEvent};

/// Extracts the session id from `sessionID`.
///
/// OpenCode session ids are not UUIDs, so they hash into the deterministic
/// namespace the same way transcript paths do.
pub(crate) fn session_id(payload: &Value) -> Uuid {
    match str_field(payload, "sessionID") {
        Some(raw) => Uuid::parse_str(raw).unwrap_or_else(|_| session_id_from_path(raw)),
        None => Uuid::nil(),
    }
}

/// Maps an OpenCode hook payload into the canonical tool event shape.
pub(crate) fn adapt(payload: &Value) -> Option<ToolEvent> {
    let tool_name = str_field(payload, "tool")?.to_string();
    let args = payload.get("args");

    let tool_call_id = str_field(payload, "callID").unwrap_or("unpaired").to_string();

    let file_path = args.and_then(|a| str_field(a, "filePath")).map(PathBuf::from);

    let edits = args.map(|args| extract_edits(&tool_name, args)).unwrap_or_default();

    let cwd = str_field(payload, "directory").map(PathBuf::from);

    Some(ToolEvent {
        tool_name,
        tool_call_id,
        file_path,
        edits,
        cwd,
    })
}

/// Pulls edit records out of a tool's args object.
fn extract_edits(tool_name: &str, args: &Value) -> Vec<EditRecord> {
    match tool_name {
        "edit" => {
            let Some(new_string) = str_field(args, "newString") else {
                return Vec::new();
            };
            vec![EditRecord {
                old_string: str_field(args, "oldString").unwrap_or_default().to_string(),
                new_string: new_string.to_string(),
                range: None,
            }]
        }
        "write" => str_field(args, "content")
            .map(|content| {
                vec![EditRecord {
                    old_string: String::new(),
                    new_string: content.to_string(),
                    range: None,
                }]
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_tool_maps_old_and_new_strings() {
        let payload = json!({
            "sessionID": "ses_9a8b7c6d",
            "tool": "edit",
            "callID": "call_3",
            "directory": "/tmp/project",
            "args": {
                "filePath": "/tmp/project/src/app.ts",
                "oldString": "let a",
                "newString": "const a",
            },
        });

        let event = adapt(&payload).unwrap();
        assert_eq!(event.tool_name, "edit");
        assert_eq!(event.tool_call_id, "call_3");
        assert_eq!(event.edits[0].new_string, "const a");
    }

    #[test]
    fn write_tool_maps_content() {
        let payload = json!({
            "tool": "write",
            "args": {"filePath": "/tmp/p/a.ts", "content": "export {};\n"},
        });

        let event = adapt(&payload).unwrap();
        assert_eq!(event.edits[0].old_string, "");
        assert_eq!(event.edits[0].new_string, "export {};\n");
    }

    #[test]
    fn bash_tool_has_no_edits() {
        let payload = json!({"tool": "bash", "args": {"command": "ls"}});
        let event = adapt(&payload).unwrap();
        assert!(event.edits.is_empty());
    }

    #[test]
    fn payload_without_tool_is_rejected() {
        assert!(adapt(&json!({"sessionID": "ses_1"})).is_none());
    }

    #[test]
    fn non_uuid_session_ids_hash_deterministically() {
        let payload = json!({"sessionID": "ses_9a8b7c6d"});
        let id = session_id(&payload);
        assert_ne!(id, Uuid::nil());
        assert_eq!(id, session_id(&payload));
    }

    #[test]
    fn missing_session_id_is_nil() {
        assert_eq!(session_id(&json!({})), Uuid::nil());
    }
}
