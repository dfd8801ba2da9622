//! Raw machine-readable status record parsing.
//!
//! Decodes the NUL-separated output of a tree-comparison command run with
//! `--raw -z` into structured records. Each record is a metadata token of
//! the form `:<oldMode> <newMode> <oldSha> <newSha> <statusLetter>[score]`
//! followed by one path token, or two path tokens (old then new) for
//! renames and copies.
//!
//! Parsing is defensive: a malformed or unrecognized leading token is
//! skipped with a warning rather than aborting, so one corrupt record never
//! loses the rest of the listing.

use tracing::warn;

/// One decoded status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatusRecord {
    /// File mode on the old side (e.g. `100644`, `000000` for additions).
    pub old_mode: String,

    /// File mode on the new side.
    pub new_mode: String,

    /// Object hash on the old side.
    pub old_sha: String,

    /// Object hash on the new side.
    pub new_sha: String,

    /// Single-letter status (`A`, `M`, `D`, `R`, `C`, `T`, ...).
    pub status: char,

    /// Similarity score for renames and copies, when present.
    pub similarity: Option<u32>,

    /// The record's path; the *new* path for renames and copies.
    pub path: String,

    /// The old path, present only for renames and copies.
    pub old_path: Option<String>,
}

/// Status letters whose record carries two path tokens (old then new).
fn takes_two_paths(status: char) -> bool {
    matches!(status, 'R' | 'C')
}

/// Parses a NUL-separated raw status listing into records.
///
/// Tokens that do not start with `:` where a metadata token is expected are
/// skipped (they are usually strays from an earlier malformed record), as
/// are metadata tokens with missing fields or records missing their path
/// tokens at end of input.
#[must_use]
pub fn parse_raw_status(raw: &str) -> Vec<RawStatusRecord> {
    let tokens: Vec<&str> = raw.split('\0').collect();
    let mut records = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        index += 1;

        if token.is_empty() {
            continue;
        }
        let Some(meta) = token.strip_prefix(':') else {
            warn!(token, "skipping unexpected token in raw status listing");
            continue;
        };

        let Some(parsed) = parse_meta(meta) else {
            warn!(token, "skipping malformed raw status record");
            continue;
        };

        let path_count = if takes_two_paths(parsed.status) { 2 } else { 1 };
        if index + path_count > tokens.len() {
            warn!(token, "raw status record truncated at end of listing");
            break;
        }

        let (old_path, path) = if path_count == 2 {
            let old = tokens[index].to_string();
            let new = tokens[index + 1].to_string();
            (Some(old), new)
        } else {
            (None, tokens[index].to_string())
        };
        index += path_count;

        if path.is_empty() {
            warn!(token, "skipping raw status record with empty path");
            continue;
        }

        records.push(RawStatusRecord {
            old_mode: parsed.old_mode,
            new_mode: parsed.new_mode,
            old_sha: parsed.old_sha,
            new_sha: parsed.new_sha,
            status: parsed.status,
            similarity: parsed.similarity,
            path,
            old_path,
        });
    }

    records
}

/// The decoded fields of a metadata token, before its paths are attached.
struct ParsedMeta {
    old_mode: String,
    new_mode: String,
    old_sha: String,
    new_sha: String,
    status: char,
    similarity: Option<u32>,
}

/// Splits a metadata token into its five space-separated fields.
fn parse_meta(meta: &str) -> Option<ParsedMeta> {
    let mut fields = meta.split_whitespace();
    let old_mode = fields.next()?.to_string();
    let new_mode = fields.next()?.to_string();
    let old_sha = fields.next()?.to_string();
    let new_sha = fields.next()?.to_string();
    let status_field = fields.next()?;

    let mut chars = status_field.chars();
    let status = chars.next()?;
    let score = chars.as_str();
    let similarity = if score.is_empty() {
        None
    } else {
        // A non-numeric score marks the record malformed rather than
        // silently dropping the suffix.
        Some(score.parse().ok()?)
    };

    Some(ParsedMeta {
        old_mode,
        new_mode,
        old_sha,
        new_sha,
        status,
        similarity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_modification_record() {
        let raw = ":100644 100644 1111111 2222222 M\0src/main.rs\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, 'M');
        assert_eq!(records[0].path, "src/main.rs");
        assert_eq!(records[0].old_path, None);
        assert_eq!(records[0].similarity, None);
    }

    #[test]
    fn rename_record_consumes_two_paths() {
        let raw = ":100644 100644 1111111 2222222 R095\0src/old.rs\0src/new.rs\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, 'R');
        assert_eq!(records[0].similarity, Some(95));
        assert_eq!(records[0].old_path.as_deref(), Some("src/old.rs"));
        assert_eq!(records[0].path, "src/new.rs");
    }

    #[test]
    fn copy_record_consumes_two_paths() {
        let raw = ":100644 100644 1111111 2222222 C100\0lib/base.rs\0lib/copy.rs\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, 'C');
        assert_eq!(records[0].old_path.as_deref(), Some("lib/base.rs"));
        assert_eq!(records[0].path, "lib/copy.rs");
    }

    #[test]
    fn multiple_records_parse_in_order() {
        let raw = ":000000 100644 0000000 1111111 A\0added.txt\0\
                   :100644 000000 2222222 0000000 D\0removed.txt\0\
                   :100644 100644 3333333 4444444 M\0changed.txt\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, 'A');
        assert_eq!(records[1].status, 'D');
        assert_eq!(records[2].status, 'M');
    }

    #[test]
    fn malformed_record_does_not_lose_the_rest() {
        let raw = ":garbage\0stray-path\0:100644 100644 1111111 2222222 M\0kept.rs\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "kept.rs");
    }

    #[test]
    fn path_with_spaces_survives_nul_separation() {
        let raw = ":100644 100644 1111111 2222222 M\0docs/my notes.md\0";
        let records = parse_raw_status(raw);
        assert_eq!(records[0].path, "docs/my notes.md");
    }

    #[test]
    fn type_change_record_parses() {
        let raw = ":100644 120000 1111111 2222222 T\0link-now\0";
        let records = parse_raw_status(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, 'T');
        assert_eq!(records[0].old_mode, "100644");
        assert_eq!(records[0].new_mode, "120000");
    }

    #[test]
    fn truncated_rename_is_dropped() {
        // Rename metadata promises two paths but only one follows.
        let raw = ":100644 100644 1111111 2222222 R090\0only-one-path";
        let records = parse_raw_status(raw);
        assert!(records.is_empty());
    }

    #[test]
    fn non_numeric_similarity_is_malformed() {
        let raw = ":100644 100644 1111111 2222222 Rxy\0a\0b\0";
        assert!(parse_raw_status(raw).is_empty());
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_raw_status("").is_empty());
        assert!(parse_raw_status("\0").is_empty());
    }
}
