//! Configuration for EditTrace.
//!
//! Runtime knobs come from environment variables; the per-root ignore and
//! redaction policy comes from a JSON config file resolved against the
//! repository root with a home-directory fallback.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `EDITTRACE_SOURCE_ID` | No | hostname | Identifier stamped on emitted events |
//! | `EDITTRACE_STATE_TTL_HOURS` | No | 24 | Age cutoff for the state garbage collector |
//! | `EDITTRACE_INCLUDE_PATCH` | No | false | Attach 3-line-context patch text to events |
//! | `EDITTRACE_WORKSPACE_ROOT` | No | - | Workspace root override (see [`crate::paths`]) |
//!
//! # Ignore config file
//!
//! `<root>/.edittrace/config.json`, falling back to `~/.edittrace/config.json`:
//!
//! ```json
//! {
//!   "useGitignore": true,
//!   "useBuiltinSensitive": true,
//!   "patterns": ["internal/**"],
//!   "mode": "redact"
//! }
//! ```
//!
//! A missing or malformed file falls back to defaults with a warning; a
//! malformed config must never block tracing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::STATE_DIR_NAME;

/// Default TTL for persisted state files, in hours.
pub const DEFAULT_STATE_TTL_HOURS: u64 = 24;

/// Filename of the ignore config inside the state directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// What to do with content for a path the policy matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMode {
    /// Replace sensitive fields with the redaction marker.
    Redact,
    /// Drop the event's content entirely.
    Skip,
}

/// The per-root ignore and redaction policy configuration.
///
/// Loaded once per root and treated as read-only for the lifetime of a
/// trace session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IgnoreConfig {
    /// Consult the VCS ignore rules (one cached subprocess per path).
    pub use_gitignore: bool,

    /// Check the built-in sensitive-file patterns first.
    pub use_builtin_sensitive: bool,

    /// Additional user-configured glob patterns.
    pub patterns: Vec<String>,

    /// Whether a match redacts content or skips the event.
    pub mode: RedactionMode,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_gitignore: true,
            use_builtin_sensitive: true,
            patterns: Vec::new(),
            mode: RedactionMode::Redact,
        }
    }
}

impl IgnoreConfig {
    /// Loads the ignore config for a repository root.
    ///
    /// Resolution: `<root>/.edittrace/config.json`, then
    /// `~/.edittrace/config.json`, then defaults. A file that exists but
    /// fails to parse falls back to defaults with a warning rather than
    /// surfacing an error.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let mut candidates = vec![root.join(STATE_DIR_NAME).join(CONFIG_FILE_NAME)];
        if let Some(base_dirs) = BaseDirs::new() {
            candidates.push(base_dirs.home_dir().join(STATE_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        for path in candidates {
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded ignore config");
                        return config;
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "malformed ignore config, using defaults");
                        return Self::default();
                    }
                },
                Err(_) => continue, // missing file: try the next candidate
            }
        }

        Self::default()
    }
}

/// Runtime configuration assembled from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier stamped on emitted events (defaults to the hostname).
    pub source_id: String,

    /// Age cutoff for the state garbage collector, in hours.
    pub state_ttl_hours: u64,

    /// Attach human-readable 3-line-context patch text to trace events.
    ///
    /// Off by default: the context diff costs an extra subprocess per
    /// event and most consumers only need hunk boundaries.
    pub include_patch: bool,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `EDITTRACE_STATE_TTL_HOURS` is set but is
    /// not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let source_id = env::var("EDITTRACE_SOURCE_ID").unwrap_or_else(|_| default_source_id());

        let state_ttl_hours = match env::var("EDITTRACE_STATE_TTL_HOURS") {
            Ok(val) => {
                let hours = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "EDITTRACE_STATE_TTL_HOURS".to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
                if hours == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "EDITTRACE_STATE_TTL_HOURS".to_string(),
                        message: "TTL must be at least 1 hour".to_string(),
                    });
                }
                hours
            }
            Err(_) => DEFAULT_STATE_TTL_HOURS,
        };

        let include_patch = env::var("EDITTRACE_INCLUDE_PATCH")
            .map(|val| matches!(val.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            source_id,
            state_ttl_hours,
            include_patch,
        })
    }
}

/// Returns the machine hostname, falling back to a fixed label.
fn default_source_id() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Returns the default state directory path for a root.
#[must_use]
pub fn state_dir_for(root: &Path) -> PathBuf {
    root.join(STATE_DIR_NAME)
}
