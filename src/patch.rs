//! Multi-file unified-diff stream segmentation.
//!
//! This module splits the output of a tree-to-tree diff into per-file patch
//! text, so each file's hunks can be parsed in isolation and attached to the
//! right [`FileDiff`](crate::types::FileDiff).
//!
//! # Path resolution
//!
//! Each section begins with a `diff --git a/<old> b/<new>` header line. The
//! section's path is resolved with the following precedence:
//!
//! 1. The `+++ b/<path>` marker, when present and not `/dev/null`
//! 2. The `b/` side of the `diff --git` header line
//!
//! This correctly disambiguates renames (paths differ between the header and
//! the markers), paths containing spaces, and binary sections (which have no
//! `+++` line at all).
//!
//! # Example
//!
//! ```
//! use edittrace::patch::segment_patch_by_file;
//!
//! let diff = "diff --git a/src/a.rs b/src/a.rs\n\
//!             --- a/src/a.rs\n\
//!             +++ b/src/a.rs\n\
//!             @@ -1,1 +1,1 @@\n-x\n+y\n\
//!             diff --git a/src/b.rs b/src/b.rs\n\
//!             --- a/src/b.rs\n\
//!             +++ b/src/b.rs\n\
//!             @@ -2,1 +2,2 @@\n+z\n";
//! let segments = segment_patch_by_file(diff);
//! assert_eq!(segments.len(), 2);
//! assert!(segments["src/a.rs"].contains("@@ -1,1 +1,1 @@"));
//! assert!(segments["src/b.rs"].contains("@@ -2,1 +2,2 @@"));
//! ```

use std::collections::HashMap;

use tracing::warn;

/// Marker line prefix for binary files compared without a binary patch.
const BINARY_FILES_MARKER: &str = "Binary files ";

/// Marker line for binary files compared with `--binary`.
const GIT_BINARY_PATCH_MARKER: &str = "GIT binary patch";

/// Splits a multi-file unified-diff stream into per-file patch text.
///
/// Each returned value contains that file's complete section including the
/// `diff --git` header, index/mode lines, `---`/`+++` markers, and hunks.
/// Sections whose path cannot be resolved at all are dropped with a warning
/// rather than failing the whole segmentation.
#[must_use]
pub fn segment_patch_by_file(patch: &str) -> HashMap<String, String> {
    let mut segments = HashMap::new();
    let mut current: Option<Section> = None;

    for line in patch.lines() {
        if line.starts_with("diff --git ") {
            flush(&mut segments, current.take());
            current = Some(Section::new(line));
            continue;
        }
        if let Some(section) = current.as_mut() {
            section.push(line);
        }
        // Preamble before the first header (none for diff-tree output) is
        // not attributable to any file and is dropped.
    }
    flush(&mut segments, current.take());

    segments
}

/// Returns true when a per-file patch segment describes a binary change.
///
/// Detects both the plain `Binary files ... differ` marker and the
/// `GIT binary patch` form produced by `--binary` diffs.
#[must_use]
pub fn is_binary_patch(segment: &str) -> bool {
    segment
        .lines()
        .any(|line| line.starts_with(BINARY_FILES_MARKER) || line == GIT_BINARY_PATCH_MARKER)
}

/// A file section being accumulated, with the path candidates seen so far.
struct Section {
    header: String,
    lines: Vec<String>,
    new_marker_path: Option<String>,
}

impl Section {
    fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            lines: vec![header.to_string()],
            new_marker_path: None,
        }
    }

    fn push(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix("+++ ") {
            if let Some(path) = strip_marker_path(rest, "b/") {
                self.new_marker_path = Some(path);
            }
        }
        self.lines.push(line.to_string());
    }

    /// Resolves this section's path: the `+++` marker wins, the header line
    /// is the fallback for deletions and binary sections.
    fn resolve_path(&self) -> Option<String> {
        if let Some(path) = &self.new_marker_path {
            return Some(path.clone());
        }
        header_new_path(&self.header)
    }

    fn text(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn flush(segments: &mut HashMap<String, String>, section: Option<Section>) {
    let Some(section) = section else {
        return;
    };
    match section.resolve_path() {
        Some(path) => {
            segments.insert(path, section.text());
        }
        None => {
            warn!(header = %section.header, "dropping diff section with unresolvable path");
        }
    }
}

/// Extracts the path from a `---`/`+++` marker payload.
///
/// Returns `None` for `/dev/null` (a deletion or creation side). A trailing
/// tab-separated annotation, as emitted for paths with trailing whitespace,
/// is stripped.
fn strip_marker_path(rest: &str, prefix: &str) -> Option<String> {
    let rest = rest.split('\t').next().unwrap_or(rest);
    if rest == "/dev/null" {
        return None;
    }
    let path = rest.strip_prefix(prefix).unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Extracts the `b/` side path from a `diff --git a/<old> b/<new>` header.
///
/// Splitting on the first `" b/"` occurrence resolves the common cases,
/// including paths containing spaces, because the `a/` side of a rename
/// never contains the literal `" b/"` separator before the real one unless
/// the old path itself embeds it; such pathological names are resolved by
/// the `+++` marker instead.
fn header_new_path(header: &str) -> Option<String> {
    let rest = header.strip_prefix("diff --git ")?;
    let idx = rest.find(" b/")?;
    let path = &rest[idx + 3..];
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
