//! Position and content-hash engine for edit anchors.
//!
//! For each edit reported by a tool call this module derives a stable
//! [`RangePosition`]: a 1-indexed line span identifying *where* the edit
//! landed, and a content hash identifying *what* was inserted. The two are
//! deliberately independent, so a trace consumer can re-locate an edit after
//! the file has drifted: the hash still recognizes the inserted text even
//! when the line numbers no longer match.
//!
//! # Hash contract
//!
//! `content_hash` is always `"murmur3:"` followed by eight lowercase hex
//! digits of the 32-bit murmur3 of the edit's replacement text alone.
//! Surrounding file content never participates, so two edits inserting
//! identical text produce identical hashes regardless of location. The
//! function is pure: identical input always yields an identical hash.
//!
//! # Example
//!
//! ```
//! use edittrace::position::{compute_range_positions, EditRecord};
//!
//! let edits = vec![EditRecord {
//!     old_string: "let x = 1;".to_string(),
//!     new_string: "let x = 2;".to_string(),
//!     range: None,
//! }];
//! let content = "fn main() {\n    let x = 1;\n}\n";
//! let positions = compute_range_positions(&edits, Some(content));
//!
//! assert_eq!(positions[0].start_line, 2);
//! assert!(positions[0].content_hash.starts_with("murmur3:"));
//! ```

use std::io::Cursor;

use murmur3::murmur3_32;
use serde::{Deserialize, Serialize};

use crate::types::RangePosition;

/// Seed for the murmur3 hash. Fixed so hashes are comparable across runs.
const MURMUR3_SEED: u32 = 0;

/// An explicit line/column range supplied by a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRange {
    /// First affected line (1-indexed).
    pub start_line: u32,

    /// Last affected line (1-indexed, inclusive).
    pub end_line: u32,

    /// Starting column, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,

    /// Ending column, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

/// One edit reported by a tool call: replaced text, replacement text, and an
/// optional explicit range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    /// The text being replaced. Empty for whole-file writes.
    #[serde(default)]
    pub old_string: String,

    /// The replacement text.
    #[serde(default)]
    pub new_string: String,

    /// Explicit range, when the provider supplies one. Takes precedence over
    /// locating `old_string` in file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<EditRange>,
}

/// Computes a stable position anchor for each edit.
///
/// Resolution order per edit:
/// 1. An explicit `range` is used verbatim for the line and column fields.
/// 2. Otherwise, with full file content available, the first occurrence of
///    `old_string` determines `start_line` by counting preceding line
///    breaks (1-indexed); `end_line` defaults to `start_line`.
/// 3. Absent both, the anchor defaults to line 1.
///
/// The `content_hash` is computed from `new_string` alone in every case.
#[must_use]
pub fn compute_range_positions(
    edits: &[EditRecord],
    file_content: Option<&str>,
) -> Vec<RangePosition> {
    edits
        .iter()
        .map(|edit| compute_position(edit, file_content))
        .collect()
}

/// Computes the position anchor for a single edit.
fn compute_position(edit: &EditRecord, file_content: Option<&str>) -> RangePosition {
    if let Some(range) = edit.range {
        return RangePosition {
            start_line: range.start_line,
            end_line: range.end_line,
            start_column: range.start_column,
            end_column: range.end_column,
            content_hash: content_hash(&edit.new_string),
        };
    }

    let start_line = file_content
        .and_then(|content| locate_line(content, &edit.old_string))
        .unwrap_or(1);

    RangePosition {
        start_line,
        end_line: start_line,
        start_column: None,
        end_column: None,
        content_hash: content_hash(&edit.new_string),
    }
}

/// Hashes replacement text into the `murmur3:<8 hex digits>` anchor format.
#[must_use]
pub fn content_hash(text: &str) -> String {
    // Reading from an in-memory cursor cannot fail.
    let digest = murmur3_32(&mut Cursor::new(text.as_bytes()), MURMUR3_SEED).unwrap_or_default();
    format!("murmur3:{digest:08x}")
}

/// Finds the 1-indexed line of the first occurrence of `needle` in `content`.
///
/// Returns `None` when the needle does not occur. An empty needle matches at
/// the start of the content, anchoring on line 1.
fn locate_line(content: &str, needle: &str) -> Option<u32> {
    let offset = content.find(needle)?;
    let preceding_breaks = content[..offset].bytes().filter(|b| *b == b'\n').count();
    Some(preceding_breaks as u32 + 1)
}
