//! Version-control backends: context detection and snapshot providers.
//!
//! This module defines the [`SnapshotProvider`] capability the tracer needs
//! from a VCS backend, a static priority-ordered list of backend instances,
//! and [`detect_vcs_context`], which identifies the repository surrounding a
//! directory without ever failing.
//!
//! # Backends
//!
//! Context detection probes `jj > git > hg > svn`, first match wins. Only
//! the [git backend](git::GitProvider) implements snapshot capture and
//! diffing in this scope; the other backends are consulted for context
//! detection only.
//!
//! # Subprocess model
//!
//! Every backend query is an independent out-of-process invocation. The
//! runner drains standard output and standard error completely and observes
//! the exit status before returning; a non-zero exit is fatal to the
//! operation that spawned it, never to the host process.

pub mod git;
pub mod raw_status;

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Result, TraceError};
use crate::types::{NormalizedDiff, SnapshotId, VcsContext, VcsInfo, VcsKind};

pub use git::GitProvider;

/// Options controlling how much work a diff computation performs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    /// Also produce 3-line-context patch text for human consumption.
    ///
    /// Off by default: the context diff costs an extra subprocess invocation
    /// that most trace events do not need.
    pub include_patch: bool,
}

/// The capability set a VCS backend offers the tracer.
///
/// Implementations must not mutate the repository's working directory,
/// staging area, or HEAD under any operation.
pub trait SnapshotProvider {
    /// The backend this provider drives.
    fn kind(&self) -> VcsKind;

    /// Returns true when this backend claims `root`.
    fn detect(&self, root: &Path) -> bool;

    /// Captures a content-addressable snapshot of the current on-disk tree
    /// state, including untracked files.
    fn capture_snapshot(&self, root: &Path) -> Result<SnapshotId>;

    /// Computes the structured change set between two snapshots.
    fn diff_snapshots(
        &self,
        from: &SnapshotId,
        to: &SnapshotId,
        root: &Path,
        opts: &DiffOptions,
    ) -> Result<NormalizedDiff>;
}

/// Snapshot-capable backends in priority order.
static PROVIDERS: &[&(dyn SnapshotProvider + Sync)] = &[&GitProvider];

/// Returns the first snapshot provider claiming `root`, if any.
#[must_use]
pub fn provider_for(root: &Path) -> Option<&'static (dyn SnapshotProvider + Sync)> {
    PROVIDERS.iter().copied().find(|p| p.detect(root))
}

/// Returns the snapshot provider for `root`, or a [`TraceError::NoProvider`].
pub fn require_provider(root: &Path) -> Result<&'static (dyn SnapshotProvider + Sync)> {
    provider_for(root).ok_or_else(|| TraceError::NoProvider {
        root: root.display().to_string(),
    })
}

/// Root and revision queries for one detectable backend.
struct ContextProbe {
    kind: VcsKind,
    root_args: &'static [&'static str],
    revision_args: &'static [&'static str],
}

/// Detection probes in priority order: `jj > git > hg > svn`.
static CONTEXT_PROBES: &[ContextProbe] = &[
    ContextProbe {
        kind: VcsKind::Jj,
        root_args: &["root"],
        revision_args: &["log", "-r", "@", "--no-graph", "-T", "change_id"],
    },
    ContextProbe {
        kind: VcsKind::Git,
        root_args: &["rev-parse", "--show-toplevel"],
        revision_args: &["rev-parse", "HEAD"],
    },
    ContextProbe {
        kind: VcsKind::Hg,
        root_args: &["root"],
        revision_args: &["id", "-i"],
    },
    ContextProbe {
        kind: VcsKind::Svn,
        root_args: &["info", "--show-item", "wc-root"],
        revision_args: &["info", "--show-item", "revision"],
    },
];

/// Detects the VCS context surrounding `start_dir`.
///
/// Probes backends in fixed priority order (`jj > git > hg > svn`) by
/// invoking each backend's root query; the first success wins and its
/// revision query is invoked next. Revision failure after a successful root
/// query yields a populated `root` with `vcs = None`. When every backend
/// fails, `root` falls back to `start_dir`.
///
/// This function never returns an error: all subprocess failures collapse
/// into absent fields.
#[must_use]
pub fn detect_vcs_context(start_dir: &Path) -> VcsContext {
    for probe in CONTEXT_PROBES {
        let Some(root) = query(probe.kind.binary(), probe.root_args, start_dir) else {
            continue;
        };
        debug!(backend = probe.kind.binary(), root = %root, "VCS root detected");

        let vcs = query(probe.kind.binary(), probe.revision_args, start_dir).map(|revision| VcsInfo {
            kind: probe.kind,
            revision: normalize_revision(probe.kind, revision),
        });

        return VcsContext {
            root: PathBuf::from(root),
            vcs,
        };
    }

    VcsContext {
        root: start_dir.to_path_buf(),
        vcs: None,
    }
}

/// Normalizes a backend's revision string.
///
/// hg appends `+` to the revision when the working copy is dirty; the
/// marker is not part of the revision id, so one trailing `+` is stripped.
/// Every other character, and every other backend's output, is preserved
/// exactly.
fn normalize_revision(kind: VcsKind, revision: String) -> String {
    match kind {
        VcsKind::Hg => revision
            .strip_suffix('+')
            .map(str::to_string)
            .unwrap_or(revision),
        _ => revision,
    }
}

/// Runs a backend query, returning trimmed stdout on success and `None` on
/// any failure (missing binary, non-zero exit, empty output).
fn query(backend: &str, args: &[&str], cwd: &Path) -> Option<String> {
    let output = Command::new(backend).args(args).current_dir(cwd).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Runs a backend command, draining both streams and observing the exit
/// status before returning stdout.
///
/// `envs` are injected into the child environment; the caller's environment
/// is otherwise inherited. A non-zero exit maps to
/// [`TraceError::Subprocess`] carrying the backend name, exit code, and the
/// captured standard-error text.
pub(crate) fn run_vcs(
    backend: &'static str,
    args: &[&str],
    cwd: &Path,
    envs: &[(&str, &Path)],
) -> Result<String> {
    let mut command = Command::new(backend);
    command.args(args).current_dir(cwd);
    for (key, value) in envs {
        command.env(key, value);
    }

    // `output()` reads both pipes to EOF and then waits, so the exit status
    // always reflects a fully drained child.
    let output = command.output()?;
    if !output.status.success() {
        return Err(TraceError::Subprocess {
            backend: backend.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
