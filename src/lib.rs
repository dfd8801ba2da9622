//! EditTrace - AI coding session tracer.
//!
//! This crate instruments AI coding-assistant sessions: every tool
//! invocation is captured, attributed to a precise source-code location,
//! and emitted as a structured trace event.
//!
//! # Overview
//!
//! The tracer captures a content-addressable "before" snapshot of the
//! repository, lets the tool call happen, captures an "after" snapshot, and
//! diffs the two - all without touching the working directory, staging
//! area, or HEAD. Reported edits additionally receive a stable position
//! anchor (line range plus content hash) so downstream consumers can
//! re-locate them after the file drifts.
//!
//! # Privacy
//!
//! Before any edit content is persisted, the [`ignore`] policy decides per
//! path whether to redact or skip: built-in sensitive-file patterns first,
//! then user-configured globs, then the VCS ignore rules. Redaction
//! operates on a deep copy via [`redact`]; raw payloads are never mutated.
//!
//! # Modules
//!
//! - [`types`]: Core data model and trace event schema
//! - [`vcs`]: Snapshot providers and VCS context detection
//! - [`hunks`]: Unified-diff hunk header parsing
//! - [`patch`]: Multi-file diff stream segmentation
//! - [`position`]: Position/content-hash engine for edit anchors
//! - [`ignore`]: Ignore and redaction policy evaluation
//! - [`redact`]: Recursive payload redaction
//! - [`state`]: Pre-edit state persistence and garbage collection
//! - [`emitter`]: Trace event assembly and the JSONL sink
//! - [`providers`]: AI-assistant hook payload adapters
//! - [`paths`]: Path normalization and workspace root resolution
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for trace operations

pub mod config;
pub mod emitter;
pub mod error;
pub mod hunks;
pub mod ignore;
pub mod patch;
pub mod paths;
pub mod position;
pub mod providers;
pub mod redact;
pub mod state;
pub mod types;
pub mod vcs;

pub use config::{Config, IgnoreConfig, RedactionMode};
pub use emitter::TraceSink;
pub use error::{Result, TraceError};
pub use hunks::parse_hunks_from_patch;
pub use ignore::{IgnorePolicy, PolicyDecision};
pub use patch::{is_binary_patch, segment_patch_by_file};
pub use paths::{resolve_workspace_root, to_relative_path};
pub use position::{compute_range_positions, content_hash, EditRange, EditRecord};
pub use providers::{Provider, ToolEvent};
pub use redact::{redact_payload, REDACTION_MARKER};
pub use state::{save_pre_edit_state, sweep_stale, take_pre_edit_state, PreEditState};
pub use types::{
    ChangeType, FileDiff, FileStatus, Hunk, NormalizedDiff, RangePosition, SnapshotId, TraceEvent,
    TracePayload, VcsContext, VcsInfo, VcsKind,
};
pub use vcs::{detect_vcs_context, provider_for, require_provider, DiffOptions, SnapshotProvider};
