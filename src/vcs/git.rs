//! Git snapshot provider.
//!
//! Captures content-addressable tree snapshots and computes structured
//! diffs between them, without ever touching the repository's real index,
//! working directory, or HEAD.
//!
//! # Snapshot mechanism
//!
//! `capture_snapshot` stages every path (tracked and untracked) into a
//! throwaway index file injected via `GIT_INDEX_FILE`, writes that index as
//! a tree object, and returns the tree id. The throwaway index is uniquely
//! named per call (pid + millisecond timestamp + random suffix), so
//! concurrent captures across sessions cannot collide, and it is removed on
//! every exit path by a scoped guard. The repository's own index never sees
//! the staged state.
//!
//! # Diff mechanism
//!
//! `diff_snapshots` runs three tree comparisons at most: a raw NUL-separated
//! status listing with rename detection, a zero-context unified diff for
//! exact hunk boundaries, and (only when the caller asks for human-readable
//! patch text) a 3-line-context diff.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, warn};

use crate::error::Result;
use crate::hunks::parse_hunks_from_patch;
use crate::patch::{is_binary_patch, segment_patch_by_file};
use crate::state::STATE_DIR_NAME;
use crate::types::{FileDiff, FileStatus, NormalizedDiff, SnapshotId, VcsKind};
use crate::vcs::raw_status::{parse_raw_status, RawStatusRecord};
use crate::vcs::{run_vcs, DiffOptions, SnapshotProvider};

/// Length of the random suffix in ephemeral index filenames.
const INDEX_SUFFIX_LEN: usize = 8;

/// The git snapshot provider.
///
/// Stateless: every operation is a fresh set of subprocess invocations
/// against the repository at the given root.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitProvider;

impl SnapshotProvider for GitProvider {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn detect(&self, root: &Path) -> bool {
        run_vcs("git", &["rev-parse", "--show-toplevel"], root, &[]).is_ok()
    }

    fn capture_snapshot(&self, root: &Path) -> Result<SnapshotId> {
        let index = EphemeralIndex::new();
        let env = [("GIT_INDEX_FILE", index.path())];

        // Stage the current on-disk state, untracked files included, into
        // the throwaway index. The repository's real index is untouched.
        run_vcs("git", &["add", "-A", "--", "."], root, &env)?;
        let tree = run_vcs("git", &["write-tree"], root, &env)?;

        debug!(tree = tree.trim(), "captured snapshot");
        Ok(SnapshotId(tree.trim().to_string()))
    }

    fn diff_snapshots(
        &self,
        from: &SnapshotId,
        to: &SnapshotId,
        root: &Path,
        opts: &DiffOptions,
    ) -> Result<NormalizedDiff> {
        // Identical tree ids mean identical content; skip every subprocess.
        if from == to {
            return Ok(NormalizedDiff::default());
        }

        let raw = run_vcs(
            "git",
            &["diff-tree", "--raw", "-z", "-r", "-M", from.as_str(), to.as_str()],
            root,
            &[],
        )?;
        let records = parse_raw_status(&raw);

        let zero_context = run_vcs(
            "git",
            &["diff-tree", "-r", "-M", "-p", "--unified=0", from.as_str(), to.as_str()],
            root,
            &[],
        )?;
        let hunk_segments = segment_patch_by_file(&zero_context);

        // The context-rich diff costs another subprocess; only produce it
        // when the caller asked for human-readable patch text.
        let patch_segments = if opts.include_patch {
            let contextual = run_vcs(
                "git",
                &["diff-tree", "-r", "-M", "-p", "--unified=3", from.as_str(), to.as_str()],
                root,
                &[],
            )?;
            Some(segment_patch_by_file(&contextual))
        } else {
            None
        };

        let files = records
            .into_iter()
            .filter_map(|record| assemble_file_diff(record, &hunk_segments, patch_segments.as_ref()))
            .collect();

        Ok(NormalizedDiff { files })
    }
}

/// Returns true for paths under the tracer's reserved state directory.
fn is_internal_path(path: &str) -> bool {
    path == STATE_DIR_NAME || path.starts_with(&format!("{STATE_DIR_NAME}/"))
}

/// Builds one [`FileDiff`] from a raw status record and the segmented
/// patches, or `None` when the record is filtered or unrecognized.
fn assemble_file_diff(
    record: RawStatusRecord,
    hunk_segments: &HashMap<String, String>,
    patch_segments: Option<&HashMap<String, String>>,
) -> Option<FileDiff> {
    // Internal bookkeeping paths are never externally visible changes.
    if is_internal_path(&record.path)
        || record.old_path.as_deref().is_some_and(is_internal_path)
    {
        return None;
    }

    let type_change = record.status == 'T';
    let status = match record.status {
        'A' => FileStatus::Added,
        'M' => FileStatus::Modified,
        'D' => FileStatus::Deleted,
        'R' => FileStatus::Renamed,
        // A copy introduces a new file; the source is unchanged.
        'C' => FileStatus::Added,
        // A type change (regular file <-> symlink, etc.) is classified as a
        // modification, but line attribution is meaningless across it.
        'T' => FileStatus::Modified,
        other => {
            warn!(status = %other, path = %record.path, "skipping unrecognized status letter");
            return None;
        }
    };

    let segment = hunk_segments.get(&record.path);
    let binary = segment.is_some_and(|s| is_binary_patch(s));

    let hunks = if status == FileStatus::Deleted || type_change || binary {
        if type_change {
            warn!(path = %record.path, "type change: no line attribution available");
        }
        Vec::new()
    } else {
        segment.map(|s| parse_hunks_from_patch(s)).unwrap_or_default()
    };

    let old_path = if status == FileStatus::Renamed {
        record.old_path
    } else {
        None
    };

    Some(FileDiff {
        path: record.path.clone(),
        status,
        old_path,
        binary,
        hunks,
        hunk_patch: segment.cloned(),
        patch: patch_segments.and_then(|m| m.get(&record.path)).cloned(),
    })
}

/// A uniquely named throwaway index file, removed on drop.
///
/// The file itself is created by git on first use; this guard only owns the
/// name and the cleanup obligation. Removal failure is swallowed: a stale
/// temp file is preferable to a failed trace event.
struct EphemeralIndex {
    path: PathBuf,
}

impl EphemeralIndex {
    fn new() -> Self {
        let suffix = random_suffix();
        let name = format!(
            "edittrace-index-{}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_millis(),
            suffix
        );
        Self {
            path: std::env::temp_dir().join(name),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralIndex {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Generates a short random alphanumeric suffix for index filenames.
fn random_suffix() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    (0..INDEX_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeType;

    fn record(status: char, path: &str) -> RawStatusRecord {
        RawStatusRecord {
            old_mode: "100644".to_string(),
            new_mode: "100644".to_string(),
            old_sha: "1111111".to_string(),
            new_sha: "2222222".to_string(),
            status,
            similarity: None,
            path: path.to_string(),
            old_path: None,
        }
    }

    fn segment_for(path: &str, body: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(path.to_string(), body.to_string());
        map
    }

    #[test]
    fn modified_file_gets_hunks_from_segment() {
        let segments = segment_for("src/a.rs", "@@ -1,1 +1,2 @@\n-x\n+y\n+z\n");
        let diff = assemble_file_diff(record('M', "src/a.rs"), &segments, None).unwrap();

        assert_eq!(diff.status, FileStatus::Modified);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].change_type, ChangeType::Modified);
        assert!(diff.hunk_patch.is_some());
        assert!(diff.patch.is_none());
    }

    #[test]
    fn deleted_file_always_has_empty_hunks() {
        // Even with hunk content present in the segment.
        let segments = segment_for("gone.rs", "@@ -1,3 +0,0 @@\n-a\n-b\n-c\n");
        let diff = assemble_file_diff(record('D', "gone.rs"), &segments, None).unwrap();

        assert_eq!(diff.status, FileStatus::Deleted);
        assert!(diff.hunks.is_empty());
    }

    #[test]
    fn type_change_is_modified_with_empty_hunks() {
        let segments = segment_for("link", "@@ -1,1 +1,1 @@\n-old\n+new\n");
        let diff = assemble_file_diff(record('T', "link"), &segments, None).unwrap();

        assert_eq!(diff.status, FileStatus::Modified);
        assert!(diff.hunks.is_empty());
    }

    #[test]
    fn binary_file_is_flagged_with_empty_hunks() {
        let segments = segment_for(
            "logo.png",
            "diff --git a/logo.png b/logo.png\nBinary files a/logo.png and b/logo.png differ\n",
        );
        let diff = assemble_file_diff(record('M', "logo.png"), &segments, None).unwrap();

        assert!(diff.binary);
        assert!(diff.hunks.is_empty());
    }

    #[test]
    fn rename_carries_old_path() {
        let mut rec = record('R', "src/new.rs");
        rec.old_path = Some("src/old.rs".to_string());
        rec.similarity = Some(97);
        let segments = segment_for("src/new.rs", "@@ -2,1 +2,1 @@\n-a\n+b\n");
        let diff = assemble_file_diff(rec, &segments, None).unwrap();

        assert_eq!(diff.status, FileStatus::Renamed);
        assert_eq!(diff.old_path.as_deref(), Some("src/old.rs"));
    }

    #[test]
    fn copy_is_reported_as_added() {
        let mut rec = record('C', "lib/copy.rs");
        rec.old_path = Some("lib/base.rs".to_string());
        let segments = HashMap::new();
        let diff = assemble_file_diff(rec, &segments, None).unwrap();

        assert_eq!(diff.status, FileStatus::Added);
        assert_eq!(diff.old_path, None);
    }

    #[test]
    fn unrecognized_status_is_skipped() {
        let segments = HashMap::new();
        assert!(assemble_file_diff(record('X', "weird"), &segments, None).is_none());
        assert!(assemble_file_diff(record('U', "conflicted"), &segments, None).is_none());
    }

    #[test]
    fn internal_state_paths_are_filtered() {
        let segments = HashMap::new();
        assert!(assemble_file_diff(record('A', ".edittrace/trace.jsonl"), &segments, None).is_none());
        assert!(assemble_file_diff(record('M', ".edittrace"), &segments, None).is_none());
        // A sibling that merely shares the prefix is not internal.
        assert!(assemble_file_diff(record('A', ".edittrace-backup/x"), &segments, None).is_some());
    }

    #[test]
    fn contextual_patch_is_attached_when_present() {
        let hunk_segments = segment_for("src/a.rs", "@@ -1,1 +1,1 @@\n-x\n+y\n");
        let patch_segments = segment_for("src/a.rs", "@@ -1,4 +1,4 @@\n context\n-x\n+y\n context\n");
        let diff =
            assemble_file_diff(record('M', "src/a.rs"), &hunk_segments, Some(&patch_segments))
                .unwrap();

        assert!(diff.patch.as_deref().unwrap().contains("context"));
    }

    #[test]
    fn ephemeral_index_names_are_unique() {
        let a = EphemeralIndex::new();
        let b = EphemeralIndex::new();
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().contains("edittrace-index-"));
    }

    #[test]
    fn ephemeral_index_removes_file_on_drop() {
        let index = EphemeralIndex::new();
        let path = index.path().to_path_buf();
        fs::write(&path, b"fake index").unwrap();
        drop(index);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_missing_file() {
        let index = EphemeralIndex::new();
        let path = index.path().to_path_buf();
        drop(index); // nothing was ever created
        assert!(!path.exists());
    }
}
