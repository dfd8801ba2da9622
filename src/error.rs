//! Error types for EditTrace.
//!
//! This module defines the error types used throughout the tracer crate,
//! providing structured error handling with clear, human-readable messages.
//!
//! The taxonomy follows the failure model of the trace pipeline: subprocess
//! failures are fatal to the operation that spawned them, malformed input is
//! recovered locally by the parsers (and therefore never appears here), and
//! best-effort cleanup failures are swallowed at the call site.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during trace operations.
///
/// This is the primary error type for the tracer crate, encompassing all
/// failure modes that abort a single trace event. None of these variants is
/// ever fatal to the host process.
///
/// # Examples
///
/// ```ignore
/// use edittrace::error::TraceError;
///
/// fn load_state() -> Result<(), TraceError> {
///     let contents = std::fs::read_to_string("state.json")?;
///     let state: PreEditState = serde_json::from_str(&contents)?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum TraceError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A VCS subprocess exited with a non-zero status.
    ///
    /// Carries the backend name, the exit code (when the process was not
    /// killed by a signal), and the captured standard-error text. Fatal to
    /// the snapshot or diff operation that spawned the process.
    #[error("{backend} exited with status {status}: {stderr}")]
    Subprocess {
        /// Name of the VCS backend binary (e.g. `git`).
        backend: String,
        /// Exit code, or -1 when terminated by a signal.
        status: i32,
        /// Captured standard-error output, trimmed.
        stderr: String,
    },

    /// No snapshot-capable VCS backend was found for a repository root.
    ///
    /// Context *detection* failure is not an error (it yields an absent
    /// `vcs` field); this variant is returned only when a caller explicitly
    /// asks for a snapshot in a directory no backend claims.
    #[error("no snapshot provider detected for {root}")]
    NoProvider {
        /// The directory that was probed.
        root: String,
    },

}

/// A specialized `Result` type for trace operations.
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subprocess_error_display() {
        let err = TraceError::Subprocess {
            backend: "git".to_string(),
            status: 128,
            stderr: "fatal: not a git repository".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git exited with status 128: fatal: not a git repository"
        );
    }

    #[test]
    fn no_provider_error_display() {
        let err = TraceError::NoProvider {
            root: "/tmp/project".to_string(),
        };
        assert_eq!(err.to_string(), "no snapshot provider detected for /tmp/project");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TraceError = io_err.into();
        assert!(matches!(err, TraceError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ bad json }").unwrap_err();
        let err: TraceError = json_err.into();
        assert!(matches!(err, TraceError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn config_error_conversion() {
        let config_err = ConfigError::InvalidValue {
            key: "EDITTRACE_STATE_TTL_HOURS".to_string(),
            message: "expected positive integer".to_string(),
        };
        let err: TraceError = config_err.into();
        assert!(matches!(err, TraceError::Config(_)));
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: TraceError = io_err.into();
        assert!(err.source().is_some());
    }
}
