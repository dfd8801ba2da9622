//! Unified-diff hunk header parsing.
//!
//! This module converts raw `@@ -a,b +c,d @@` hunk headers into normalized
//! 1-indexed, inclusive line ranges with a change-type classification. It is
//! fed per-file patch text produced by the [patch segmenter](crate::patch)
//! from a zero-context diff, where hunk boundaries are exact.
//!
//! # Classification
//!
//! | Header shape | Classification | Range |
//! |--------------|----------------|-------|
//! | `newCount == 0` | deleted | anchored to `max(1, newStart)` |
//! | `oldCount == 0, newCount > 0` | added | `[newStart, newStart + newCount - 1]` |
//! | otherwise | modified | `[newStart, newStart + newCount - 1]` |
//! | both counts 0 | (degenerate, no hunk) | - |
//!
//! A deletion that collapses the new side to line 0 (a file emptied
//! entirely) still reports a valid 1-based anchor. Omitted counts default
//! to 1, per the unified-diff format.
//!
//! # Example
//!
//! ```
//! use edittrace::hunks::parse_hunks_from_patch;
//! use edittrace::types::ChangeType;
//!
//! let hunks = parse_hunks_from_patch("@@ -10,0 +11,3 @@\n+a\n+b\n+c");
//! assert_eq!(hunks.len(), 1);
//! assert_eq!(hunks[0].start_line, 11);
//! assert_eq!(hunks[0].end_line, 13);
//! assert_eq!(hunks[0].change_type, ChangeType::Added);
//! ```

use tracing::warn;

use crate::types::{ChangeType, Hunk};

/// One side of a hunk header: a start line and a line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRange {
    start: u32,
    count: u32,
}

/// Parses all hunk headers in a file's patch text into normalized hunks.
///
/// Multiple headers yield multiple hunks in document order; no merging
/// across hunks is performed. Lines that are not hunk headers (context,
/// additions, deletions, file headers) are ignored. Malformed headers are
/// skipped with a warning rather than aborting the parse.
#[must_use]
pub fn parse_hunks_from_patch(patch: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();

    for line in patch.lines() {
        if !line.starts_with("@@") {
            continue;
        }
        match parse_hunk_header(line) {
            Some((old, new)) => {
                if let Some(hunk) = classify(old, new) {
                    hunks.push(hunk);
                }
            }
            None => {
                warn!(header = line, "skipping malformed hunk header");
            }
        }
    }

    hunks
}

/// Classifies a parsed header into a hunk, or `None` for the degenerate
/// both-counts-zero case.
fn classify(old: HunkRange, new: HunkRange) -> Option<Hunk> {
    if new.count == 0 {
        if old.count == 0 {
            // Degenerate header with nothing on either side.
            return None;
        }
        // Pure deletion: anchor onto the nearest surviving line. A deletion
        // at the top of the file reports newStart = 0, which must still map
        // to a valid 1-based anchor.
        let anchor = new.start.max(1);
        return Some(Hunk {
            start_line: anchor,
            end_line: anchor,
            change_type: ChangeType::Deleted,
        });
    }

    let change_type = if old.count == 0 {
        ChangeType::Added
    } else {
        ChangeType::Modified
    };

    Some(Hunk {
        start_line: new.start,
        end_line: new.start + new.count - 1,
        change_type,
    })
}

/// Parses a `@@ -<oldStart>[,<oldCount>] +<newStart>[,<newCount>] @@` header.
///
/// Returns the old and new ranges, or `None` when the header does not match
/// the expected shape.
fn parse_hunk_header(line: &str) -> Option<(HunkRange, HunkRange)> {
    let rest = line.strip_prefix("@@")?;
    let (ranges, _) = rest.split_once("@@")?;

    let mut old = None;
    let mut new = None;
    for token in ranges.split_whitespace() {
        if let Some(spec) = token.strip_prefix('-') {
            old = parse_range(spec);
        } else if let Some(spec) = token.strip_prefix('+') {
            new = parse_range(spec);
        }
    }

    Some((old?, new?))
}

/// Parses a `<start>[,<count>]` range spec. An omitted count defaults to 1.
fn parse_range(spec: &str) -> Option<HunkRange> {
    match spec.split_once(',') {
        Some((start, count)) => Some(HunkRange {
            start: start.parse().ok()?,
            count: count.parse().ok()?,
        }),
        None => Some(HunkRange {
            start: spec.parse().ok()?,
            count: 1,
        }),
    }
}
