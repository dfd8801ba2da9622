//! Core data model and trace event schema for EditTrace.
//!
//! This module defines the value types produced by the snapshot and diff
//! engines together with the trace event envelope emitted for each tool
//! invocation. All wire types serialize to camelCase JSON.
//!
//! The diff types are pure values: they are constructed per diff call,
//! consumed by the event emitter, and discarded. Nothing in this module
//! holds on to subprocess handles or file descriptors.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Length of the random alphanumeric suffix in trace event IDs.
const EVENT_ID_SUFFIX_LEN: usize = 20;

/// Prefix for all trace event IDs.
const EVENT_ID_PREFIX: &str = "trc_";

/// Opaque content-addressable identifier for a whole-tree state.
///
/// In the git backend this is a tree object hash. Two equal `SnapshotId`s
/// refer to identical tree content; the converse also holds because the id
/// is derived from the content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The version-control backends the tracer knows how to detect.
///
/// Detection probes backends in the order `Jj > Git > Hg > Svn`; only git
/// implements snapshot capture in this scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Jj,
    Git,
    Hg,
    Svn,
}

impl VcsKind {
    /// Returns the backend's binary name.
    #[must_use]
    pub fn binary(&self) -> &'static str {
        match self {
            VcsKind::Jj => "jj",
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
        }
    }
}

/// Backend identity and current revision for a detected repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcsInfo {
    /// Which backend claimed the directory.
    #[serde(rename = "type")]
    pub kind: VcsKind,

    /// The current revision identifier as reported by the backend.
    pub revision: String,
}

/// The result of VCS context detection.
///
/// `root` is always populated: when no backend claims the directory it falls
/// back to the queried directory itself. `vcs` is `None` when no backend was
/// detected or when the revision query failed after the root query succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcsContext {
    /// Absolute repository root, or the queried directory as a fallback.
    pub root: PathBuf,

    /// Backend identity and revision, when detection fully succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs: Option<VcsInfo>,
}

/// Per-file change classification between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// Classification of a single hunk's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

/// A contiguous line range reported as changed between two snapshots.
///
/// Lines are 1-indexed and the range is inclusive. `end_line >= start_line`
/// always holds; a deletion that collapses to line 0 is anchored onto line 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    /// First changed line (1-indexed).
    pub start_line: u32,

    /// Last changed line (1-indexed, inclusive).
    pub end_line: u32,

    /// How this range changed.
    pub change_type: ChangeType,
}

/// A single file's change set between two snapshots.
///
/// Invariants maintained by the diff engine:
/// - `status == Deleted` or a type-change always yields `hunks = []`
/// - `binary == true` implies `hunks = []`
/// - `old_path` is present only for renames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// Root-relative path of the file (the new path for renames).
    pub path: String,

    /// Change classification.
    pub status: FileStatus,

    /// Previous path, present only for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,

    /// Whether the file content is binary.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub binary: bool,

    /// Normalized changed line ranges, in document order.
    pub hunks: Vec<Hunk>,

    /// The file's zero-context patch text, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunk_patch: Option<String>,

    /// The file's 3-line-context patch text, when requested by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// A structured change set between two snapshots.
///
/// Empty when the snapshots are identical or contain no externally visible
/// changes (internal bookkeeping paths are filtered out).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDiff {
    /// Per-file change sets.
    pub files: Vec<FileDiff>,
}

impl NormalizedDiff {
    /// Returns true when the diff contains no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A stable anchor for an edited range: line span plus content hash.
///
/// The `content_hash` is computed purely from the edit's replacement text,
/// never from surrounding file content. Two edits that insert identical text
/// produce identical hashes regardless of location: the hash identifies
/// *content*, while *place* is carried separately by the line numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangePosition {
    /// First affected line (1-indexed).
    pub start_line: u32,

    /// Last affected line (1-indexed, inclusive).
    pub end_line: u32,

    /// Starting column, when the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,

    /// Ending column, when the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,

    /// Content hash of the replacement text, `"murmur3:" + 8 hex digits`.
    pub content_hash: String,
}

/// A trace event emitted for one tool invocation.
///
/// Events capture what an AI coding assistant changed, where, and how, and
/// are appended to the per-root trace sink for downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Unique event identifier with format `trc_` followed by 20 alphanumeric characters.
    pub id: String,

    /// Source identifier (by default the hostname).
    pub source: String,

    /// When the event was assembled.
    pub timestamp: DateTime<Utc>,

    /// Event-specific payload data.
    pub payload: TracePayload,
}

/// Payload variants for trace events.
///
/// Uses serde's internally tagged representation for clean JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TracePayload {
    /// A completed tool invocation with its attributed changes.
    #[serde(rename_all = "camelCase")]
    ToolTrace {
        session_id: Uuid,
        tool_call_id: String,
        tool: String,
        provider: String,
        vcs: Option<VcsInfo>,
        files: Vec<FileDiff>,
        positions: Vec<RangePosition>,
    },

    /// A tool invocation observed but skipped by the redaction policy.
    #[serde(rename_all = "camelCase")]
    Skipped {
        session_id: Uuid,
        tool_call_id: String,
        tool: String,
        reason: String,
    },
}

impl TraceEvent {
    /// Creates a new event with a randomly generated ID.
    #[must_use]
    pub fn new(source: String, payload: TracePayload) -> Self {
        Self {
            id: generate_event_id(),
            source,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Generates a unique event ID with the format `trc_` followed by 20 alphanumeric characters.
fn generate_event_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    let suffix: String = (0..EVENT_ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{EVENT_ID_PREFIX}{suffix}")
}
