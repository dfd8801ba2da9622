//! Ignore and redaction policy evaluation.
//!
//! Before any edit content is persisted, the policy decides per path
//! whether the content may be stored verbatim, must be redacted, or the
//! whole event skipped. Checks run in a fixed order:
//!
//! 1. Built-in sensitive-file patterns (credentials, key material, env files)
//! 2. User-configured glob patterns
//! 3. The VCS ignore check (one subprocess per path, cached for the session)
//!
//! The first matching stage decides; the configured
//! [`RedactionMode`](crate::config::RedactionMode) determines whether a
//! match redacts or skips. A builtin or user-pattern match never spawns the
//! VCS subprocess.
//!
//! # Caching
//!
//! Glob compilation and VCS ignore results are cached for the lifetime of a
//! policy instance, which callers hold for the whole trace session (ignore
//! rules are assumed stable for that long). The caches are instance fields
//! rather than process globals so a test constructs a fresh policy and
//! never sees another test's entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::config::{IgnoreConfig, RedactionMode};

/// Built-in sensitive-file patterns: credentials, key material, env files.
///
/// Matched against the root-relative path and the basename, so `.env` is
/// caught at any depth.
const BUILTIN_SENSITIVE_PATTERNS: &[&str] = &[
    ".env",
    ".env.*",
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "*.keystore",
    "*.tfstate",
    "*.tfstate.*",
    "id_rsa",
    "id_rsa.*",
    "id_ed25519",
    "id_ed25519.*",
    "credentials",
    "credentials.*",
    "secrets",
    "secrets.*",
    ".netrc",
    ".npmrc",
];

/// The per-path outcome of policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Content may be persisted verbatim.
    Allow,

    /// Content fields must be replaced with the redaction marker.
    Redact,

    /// The event must not be persisted at all for this path.
    Skip,
}

/// A compiled, cached ignore/redaction policy for one repository root.
///
/// Construct once per trace session via [`IgnorePolicy::new`] and reuse;
/// the embedded caches are append-only and never invalidated within the
/// policy's lifetime.
pub struct IgnorePolicy {
    root: PathBuf,
    config: IgnoreConfig,
    builtin: GlobSet,
    /// Compiled user patterns keyed by pattern text; `None` marks a pattern
    /// that failed to compile (warned once, then ignored).
    glob_cache: Mutex<HashMap<String, Option<GlobMatcher>>>,
    /// VCS ignore results keyed by root-relative path.
    vcs_ignore_cache: Mutex<HashMap<String, bool>>,
}

impl IgnorePolicy {
    /// Builds a policy for `root` from a loaded configuration.
    #[must_use]
    pub fn new(root: PathBuf, config: IgnoreConfig) -> Self {
        Self {
            root,
            config,
            builtin: compile_builtin(),
            glob_cache: Mutex::new(HashMap::new()),
            vcs_ignore_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Decides what may be persisted for a root-relative path.
    #[must_use]
    pub fn decide(&self, rel_path: &str) -> PolicyDecision {
        if self.config.use_builtin_sensitive && self.matches_builtin(rel_path) {
            debug!(path = rel_path, "builtin sensitive pattern matched");
            return self.matched();
        }

        if self.matches_user_pattern(rel_path) {
            debug!(path = rel_path, "user pattern matched");
            return self.matched();
        }

        if self.config.use_gitignore && self.is_vcs_ignored(rel_path) {
            debug!(path = rel_path, "path is VCS-ignored");
            return self.matched();
        }

        PolicyDecision::Allow
    }

    /// Maps a match onto the configured mode.
    fn matched(&self) -> PolicyDecision {
        match self.config.mode {
            RedactionMode::Redact => PolicyDecision::Redact,
            RedactionMode::Skip => PolicyDecision::Skip,
        }
    }

    /// Checks the built-in sensitive set against the path and its basename.
    fn matches_builtin(&self, rel_path: &str) -> bool {
        if self.builtin.is_match(rel_path) {
            return true;
        }
        Path::new(rel_path)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|basename| self.builtin.is_match(basename))
    }

    /// Checks the user-configured patterns, compiling on first use.
    fn matches_user_pattern(&self, rel_path: &str) -> bool {
        if self.config.patterns.is_empty() {
            return false;
        }

        let mut cache = match self.glob_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for pattern in &self.config.patterns {
            let matcher = cache.entry(pattern.clone()).or_insert_with(|| {
                match Glob::new(pattern) {
                    Ok(glob) => Some(glob.compile_matcher()),
                    Err(err) => {
                        warn!(pattern = %pattern, error = %err, "invalid ignore pattern");
                        None
                    }
                }
            });
            if let Some(matcher) = matcher {
                if matcher.is_match(rel_path) {
                    return true;
                }
            }
        }
        false
    }

    /// Asks the VCS whether the path is ignored, caching the answer.
    ///
    /// `git check-ignore -q` exits 0 for ignored paths, 1 for tracked or
    /// unignored paths, and anything else on error; errors count as "not
    /// ignored" so a broken repository never suppresses tracing.
    fn is_vcs_ignored(&self, rel_path: &str) -> bool {
        {
            let cache = match self.vcs_ignore_cache.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(&cached) = cache.get(rel_path) {
                return cached;
            }
        }

        let ignored = Command::new("git")
            .args(["check-ignore", "-q", "--", rel_path])
            .current_dir(&self.root)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);

        let mut cache = match self.vcs_ignore_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.insert(rel_path.to_string(), ignored);
        ignored
    }

    /// Number of cached VCS ignore results. Exposed for tests asserting the
    /// one-subprocess-per-path contract.
    #[must_use]
    pub fn vcs_cache_len(&self) -> usize {
        match self.vcs_ignore_cache.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Compiles the built-in sensitive set once per policy.
fn compile_builtin() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in BUILTIN_SENSITIVE_PATTERNS {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => {
                warn!(pattern, error = %err, "builtin pattern failed to compile");
            }
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(error = %err, "builtin sensitive set failed to build; continuing without it");
        GlobSet::empty()
    })
}
