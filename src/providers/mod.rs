//! AI coding-assistant provider adapters.
//!
//! Each supported assistant delivers hook payloads in its own JSON shape.
//! The adapters here map those payloads into one canonical [`ToolEvent`]
//! consumed by the trace pipeline. The registry is a closed enum selected
//! by an explicit provider-name parameter; there is no dynamic registration
//! and no global mutable table.
//!
//! Adapters are deliberately thin: field lookup and renaming only. Unknown
//! tool shapes adapt to `None`, never an error, so a provider can add tools
//! without breaking the tracer.

pub mod claude;
pub mod cursor;
pub mod opencode;

use std::path::PathBuf;

use serde_json::Value;
use uuid::Uuid;

use crate::position::EditRecord;

/// Namespace for deterministic session ids derived from transcript paths.
///
/// When a payload carries no usable session id, hashing the transcript path
/// into this namespace maps the same session file to the same id across
/// hook invocations and restarts.
const SESSION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x65, 0x64, 0x69, 0x74, // "edit"
    0x74, 0x72, 0x61, 0x63, // "trac"
    0x65, 0x2d, 0x73, 0x65, // "e-se"
    0x73, 0x73, 0x69, 0x6f, // "ssio"
]);

/// The canonical shape of one observed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEvent {
    /// Provider-reported tool name (e.g. `Edit`, `Write`, `Bash`).
    pub tool_name: String,

    /// Identifier pairing the pre and post hooks of one tool call.
    pub tool_call_id: String,

    /// The file the tool targeted, when it reported one.
    pub file_path: Option<PathBuf>,

    /// Specific edits the tool reported (old/new text, optional ranges).
    pub edits: Vec<EditRecord>,

    /// Working directory the payload reported, when present.
    pub cwd: Option<PathBuf>,
}

/// The supported providers, in a closed registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Cursor,
    Opencode,
}

impl Provider {
    /// All providers, for help text and validation messages.
    pub const ALL: &'static [Provider] = &[Provider::Claude, Provider::Cursor, Provider::Opencode];

    /// Resolves a provider from its CLI name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "claude" => Some(Provider::Claude),
            "cursor" => Some(Provider::Cursor),
            "opencode" => Some(Provider::Opencode),
            _ => None,
        }
    }

    /// The provider's canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Cursor => "cursor",
            Provider::Opencode => "opencode",
        }
    }

    /// Extracts or derives the session id for a hook payload.
    ///
    /// Falls back to a deterministic UUID derived from the transcript path
    /// when the payload has no parseable id, and to the nil UUID when it
    /// has neither; the pipeline still traces the event in that case, it
    /// just cannot correlate it to a session.
    #[must_use]
    pub fn session_id_for(&self, payload: &Value) -> Uuid {
        match self {
            Provider::Claude => claude::session_id(payload),
            Provider::Cursor => cursor::session_id(payload),
            Provider::Opencode => opencode::session_id(payload),
        }
    }

    /// Maps a hook payload into the canonical tool event shape.
    ///
    /// Returns `None` when the payload does not describe a tool invocation
    /// this adapter understands.
    #[must_use]
    pub fn adapt(&self, payload: &Value) -> Option<ToolEvent> {
        match self {
            Provider::Claude => claude::adapt(payload),
            Provider::Cursor => cursor::adapt(payload),
            Provider::Opencode => opencode::adapt(payload),
        }
    }
}

/// Derives a deterministic session id from a transcript or session path.
pub(crate) fn session_id_from_path(path: &str) -> Uuid {
    Uuid::new_v5(&SESSION_NAMESPACE, path.as_bytes())
}

/// Reads a string field from a JSON object.
pub(crate) fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}
