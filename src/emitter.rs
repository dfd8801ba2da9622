//! Trace event assembly and the JSONL sink.
//!
//! Each processed tool call produces one [`TraceEvent`], appended as a
//! single JSON line to `<root>/.edittrace/trace.jsonl`. The sink creates
//! the state directory on demand; append failures are operation-fatal (the
//! event is the whole point of the pipeline) and surface as errors rather
//! than warnings.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::state::state_dir;
use crate::types::TraceEvent;

/// Filename of the trace sink inside the state directory.
const TRACE_FILE_NAME: &str = "trace.jsonl";

/// An append-only JSONL sink for trace events, scoped to one repository root.
#[derive(Debug, Clone)]
pub struct TraceSink {
    path: PathBuf,
}

impl TraceSink {
    /// Creates a sink for the given repository root.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: state_dir(root).join(TRACE_FILE_NAME),
        }
    }

    /// Appends one event as a JSON line.
    ///
    /// The write is a single `write_all` of the full line, so concurrent
    /// hook processes appending to the same sink interleave whole lines on
    /// any POSIX filesystem.
    pub fn append(&self, event: &TraceEvent) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)?;

        debug!(id = %event.id, path = %self.path.display(), "appended trace event");
        Ok(())
    }

    /// The sink's file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TracePayload;
    use uuid::Uuid;

    fn sample_event(tool: &str) -> TraceEvent {
        TraceEvent::new(
            "test-host".to_string(),
            TracePayload::Skipped {
                session_id: Uuid::nil(),
                tool_call_id: "call_1".to_string(),
                tool: tool.to_string(),
                reason: "test".to_string(),
            },
        )
    }

    #[test]
    fn append_creates_state_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TraceSink::new(dir.path());

        sink.append(&sample_event("Edit")).unwrap();

        assert!(sink.path().exists());
        assert!(sink.path().starts_with(dir.path().join(".edittrace")));
    }

    #[test]
    fn events_append_as_individual_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TraceSink::new(dir.path());

        sink.append(&sample_event("Edit")).unwrap();
        sink.append(&sample_event("Write")).unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: TraceEvent = serde_json::from_str(lines[0]).unwrap();
        let second: TraceEvent = serde_json::from_str(lines[1]).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn appended_events_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TraceSink::new(dir.path());
        let event = sample_event("Bash");

        sink.append(&event).unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        let loaded: TraceEvent = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(loaded, event);
    }
}
