//! Cursor hook payload adapter.
//!
//! Cursor delivers camelCase payloads with a `conversationId`, a `toolName`
//! and a `toolInput` object. Unlike Claude Code, Cursor reports explicit
//! line/column ranges for its edits, which flow straight through to the
//! position engine without a content search.

use std::path::PathBuf;

use serde_json::Value;
use uuid::Uuid;

use crate::position::{EditRange, EditRecord};
use crate::providers::{session_id_from_path, str_field, ToolEvent};

/// Extracts the session id from `conversationId`, falling back to a
/// deterministic id from the workspace path.
pub(crate) fn session_id(payload: &Value) -> Uuid {
    if let Some(id) = str_field(payload, "conversationId").and_then(|s| Uuid::parse_str(s).ok()) {
        return id;
    }
    str_field(payload, "workspacePath")
        .map(session_id_from_path)
        .unwrap_or_else(Uuid::nil)
}

/// Maps a Cursor hook payload into the canonical tool event shape.
pub(crate) fn adapt(payload: &Value) -> Option<ToolEvent> {
    let tool_name = str_field(payload, "toolName")?.to_string();
    let input = payload.get("toolInput");

    let tool_call_id = str_field(payload, "toolCallId").unwrap_or("unpaired").to_string();

    let file_path = input
        .and_then(|i| str_field(i, "filePath"))
        .map(PathBuf::from);

    let edits = input
        .and_then(|i| i.get("edits"))
        .and_then(Value::as_array)
        .map(|edits| edits.iter().filter_map(edit_record).collect())
        .unwrap_or_default();

    let cwd = str_field(payload, "workspacePath").map(PathBuf::from);

    Some(ToolEvent {
        tool_name,
        tool_call_id,
        file_path,
        edits,
        cwd,
    })
}

/// Builds one edit record, carrying Cursor's explicit range when present.
fn edit_record(value: &Value) -> Option<EditRecord> {
    let new_string = str_field(value, "newString")?;
    let old_string = str_field(value, "oldString").unwrap_or_default();

    let range = value.get("range").and_then(|range| {
        Some(EditRange {
            start_line: range.get("startLine")?.as_u64()? as u32,
            end_line: range.get("endLine")?.as_u64()? as u32,
            start_column: range.get("startColumn").and_then(Value::as_u64).map(|c| c as u32),
            end_column: range.get("endColumn").and_then(Value::as_u64).map(|c| c as u32),
        })
    });

    Some(EditRecord {
        old_string: old_string.to_string(),
        new_string: new_string.to_string(),
        range,
    })
}
