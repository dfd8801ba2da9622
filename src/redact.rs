//! Recursive payload redaction.
//!
//! Provider hook payloads embed raw edit content (`old_string`,
//! `new_string`, whole-file `content`) that must never reach persisted
//! state for paths the [policy](crate::ignore) marks sensitive. This module
//! replaces those fields with a fixed marker on a deep copy; the original
//! payload is never mutated in place, so callers can keep using it for
//! non-persisted work (position hashing happens before redaction).

use serde_json::Value;

/// The fixed marker substituted for sensitive string values.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Field names whose string values carry raw edit content.
///
/// Matched at any nesting depth, so `tool_input.edits[2].new_string` is
/// covered as well as top-level fields.
const SENSITIVE_FIELDS: &[&str] = &[
    "old_string",
    "new_string",
    "oldString",
    "newString",
    "content",
    "file_text",
    "patch",
    "diff",
];

/// Returns a deep copy of `payload` with every sensitive string field
/// replaced by [`REDACTION_MARKER`].
///
/// Only string values are replaced; a sensitive key holding an object or
/// array is recursed into rather than clobbered, and non-sensitive fields
/// pass through untouched.
#[must_use]
pub fn redact_payload(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, value)| {
                    let value = if value.is_string() && is_sensitive_field(key) {
                        Value::String(REDACTION_MARKER.to_string())
                    } else {
                        redact_payload(value)
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_payload).collect()),
        other => other.clone(),
    }
}

/// Returns true when a field name carries raw edit content.
fn is_sensitive_field(key: &str) -> bool {
    SENSITIVE_FIELDS.contains(&key)
}
