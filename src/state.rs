//! Persisted pre-edit snapshot state.
//!
//! The pre-tool hook captures a "before" snapshot and must hand its id to
//! the post-tool hook, which runs in a separate process. The handoff goes
//! through small JSON records under the repository's reserved state
//! directory, written atomically (temp sibling, then rename) with
//! restrictive permissions.
//!
//! Stale records from crashed or abandoned tool calls are swept by a
//! time-to-live garbage collector: any non-hidden, non-lock file older than
//! the cutoff is deleted, best-effort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{SnapshotId, VcsInfo};

/// Name of the reserved state directory under a repository root.
///
/// Paths under this prefix are internal bookkeeping and are filtered from
/// every diff the tracer reports.
pub const STATE_DIR_NAME: &str = ".edittrace";

/// Subdirectory holding pre-edit snapshot records.
const PRE_STATE_SUBDIR: &str = "pre";

/// Extension marking lock files, which the garbage collector never touches.
const LOCK_EXTENSION: &str = "lock";

/// A pre-edit snapshot record, written by the pre-tool hook and consumed by
/// the post-tool hook of the same tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreEditState {
    /// VCS identity at capture time, when detection succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs: Option<VcsInfo>,

    /// Absolute repository root the snapshot was captured in.
    pub repo_root: PathBuf,

    /// The "before" snapshot id.
    pub pre_tree: SnapshotId,

    /// When the record was written.
    pub created_at: DateTime<Utc>,

    /// Process id of the writing hook.
    pub pid: u32,

    /// Provider name that produced the hook payload.
    pub provider: String,

    /// Session the tool call belongs to.
    pub session_id: Uuid,

    /// Identifier pairing the pre and post hooks of one tool call.
    pub tool_call_id: String,
}

/// Returns the state directory for a repository root.
#[must_use]
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR_NAME)
}

/// Returns the record path for a (session, tool call) pair.
fn record_path(root: &Path, session_id: Uuid, tool_call_id: &str) -> PathBuf {
    let name = format!("{}-{}.json", session_id, sanitize_component(tool_call_id));
    state_dir(root).join(PRE_STATE_SUBDIR).join(name)
}

/// Reduces an externally supplied id to a safe filename component.
fn sanitize_component(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Persists a pre-edit record atomically.
///
/// The record is serialized to a temp sibling and renamed into place, so a
/// concurrent reader sees either the old record or the new one, never a
/// torn write. On unix the file is restricted to the owning user.
pub fn save_pre_edit_state(root: &Path, record: &PreEditState) -> Result<PathBuf> {
    let path = record_path(root, record.session_id, &record.tool_call_id);
    let dir = path.parent().unwrap_or(root);
    fs::create_dir_all(dir)?;

    let mut tmp = path.clone();
    tmp.set_extension("json.tmp");

    let contents = serde_json::to_vec_pretty(record)?;
    fs::write(&tmp, contents)?;
    restrict_permissions(&tmp)?;
    fs::rename(&tmp, &path)?;

    debug!(path = %path.display(), "saved pre-edit state");
    Ok(path)
}

/// Loads and removes the record for a (session, tool call) pair.
///
/// The record is consumed: once the post-tool hook has read it, it is no
/// longer needed and is deleted best-effort. A missing or malformed record
/// yields `None` with a warning, never an error, so a lost pre-hook does
/// not abort the post-hook's own work.
#[must_use]
pub fn take_pre_edit_state(root: &Path, session_id: Uuid, tool_call_id: &str) -> Option<PreEditState> {
    let path = record_path(root, session_id, tool_call_id);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "no pre-edit state to load");
            return None;
        }
    };

    let _ = fs::remove_file(&path);

    match serde_json::from_str(&contents) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "malformed pre-edit state, ignoring");
            None
        }
    }
}

/// Sweeps stale files from the state directory.
///
/// Deletes any non-hidden, non-lock regular file under the state directory
/// (recursively) whose modification time is older than `ttl`. Deletion is
/// best-effort: a file that cannot be deleted is logged and skipped, and a
/// missing state directory sweeps nothing. Returns the number of files
/// deleted.
pub fn sweep_stale(root: &Path, ttl: Duration) -> Result<usize> {
    let dir = state_dir(root);
    if !dir.exists() {
        return Ok(0);
    }
    let cutoff = SystemTime::now()
        .checked_sub(ttl)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted = 0;
    sweep_dir(&dir, cutoff, &mut deleted)?;
    Ok(deleted)
}

fn sweep_dir(dir: &Path, cutoff: SystemTime, deleted: &mut usize) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "unreadable state directory entry, skipping");
                continue;
            }
        };
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if path.is_dir() {
            // Recurse; empty directories are left in place.
            let _ = sweep_dir(&path, cutoff, deleted);
            continue;
        }
        if name.starts_with('.') {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == LOCK_EXTENSION) {
            continue;
        }

        let stale = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .map(|modified| modified < cutoff)
            .unwrap_or(false);
        if !stale {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "swept stale state file");
                *deleted += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to sweep state file");
            }
        }
    }
    Ok(())
}

/// Restricts a state file to the owning user on unix; a no-op elsewhere.
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
