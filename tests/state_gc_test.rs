//! Pre-edit state handoff and garbage collection tests.
//!
//! The pre-tool and post-tool hooks run as separate processes; these tests
//! exercise the on-disk handoff between them and the TTL sweep that cleans
//! up after crashed or abandoned tool calls.

use std::fs;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use edittrace::state::{
    save_pre_edit_state, state_dir, sweep_stale, take_pre_edit_state, PreEditState,
};
use edittrace::types::{SnapshotId, VcsInfo, VcsKind};

// =============================================================================
// Test Helpers
// =============================================================================

fn record(session_id: Uuid, tool_call_id: &str) -> PreEditState {
    PreEditState {
        vcs: Some(VcsInfo {
            kind: VcsKind::Git,
            revision: "abc123def".to_string(),
        }),
        repo_root: "/tmp/project".into(),
        pre_tree: SnapshotId("4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string()),
        created_at: Utc::now(),
        pid: std::process::id(),
        provider: "claude".to_string(),
        session_id,
        tool_call_id: tool_call_id.to_string(),
    }
}

// =============================================================================
// Handoff
// =============================================================================

#[test]
fn handoff_roundtrips_across_save_and_take() {
    let dir = tempfile::tempdir().unwrap();
    let session = Uuid::new_v4();

    save_pre_edit_state(dir.path(), &record(session, "toolu_01")).unwrap();
    let loaded = take_pre_edit_state(dir.path(), session, "toolu_01").unwrap();

    assert_eq!(loaded.provider, "claude");
    assert_eq!(loaded.pre_tree.as_str(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    assert_eq!(loaded.vcs.unwrap().kind, VcsKind::Git);
}

#[test]
fn concurrent_tool_calls_do_not_collide() {
    // Two sessions with the same tool call id, and two calls in one
    // session, must land in distinct records.
    let dir = tempfile::tempdir().unwrap();
    let session_a = Uuid::new_v4();
    let session_b = Uuid::new_v4();

    save_pre_edit_state(dir.path(), &record(session_a, "call_1")).unwrap();
    save_pre_edit_state(dir.path(), &record(session_a, "call_2")).unwrap();
    save_pre_edit_state(dir.path(), &record(session_b, "call_1")).unwrap();

    assert!(take_pre_edit_state(dir.path(), session_a, "call_1").is_some());
    assert!(take_pre_edit_state(dir.path(), session_a, "call_2").is_some());
    assert!(take_pre_edit_state(dir.path(), session_b, "call_1").is_some());
}

#[test]
fn record_json_uses_the_documented_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let session = Uuid::new_v4();
    let path = save_pre_edit_state(dir.path(), &record(session, "call_9")).unwrap();

    let raw = fs::read_to_string(path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    for field in ["vcs", "repoRoot", "preTree", "createdAt", "pid", "provider", "sessionId", "toolCallId"] {
        assert!(json.get(field).is_some(), "missing field {field} in {raw}");
    }
}

// =============================================================================
// Garbage Collection
// =============================================================================

#[test]
fn sweep_with_generous_ttl_keeps_fresh_records() {
    let dir = tempfile::tempdir().unwrap();
    let session = Uuid::new_v4();
    save_pre_edit_state(dir.path(), &record(session, "call_1")).unwrap();

    let deleted = sweep_stale(dir.path(), Duration::from_secs(24 * 3600)).unwrap();

    assert_eq!(deleted, 0);
    assert!(take_pre_edit_state(dir.path(), session, "call_1").is_some());
}

#[test]
fn sweep_with_zero_ttl_consumes_abandoned_records() {
    let dir = tempfile::tempdir().unwrap();
    let session = Uuid::new_v4();
    save_pre_edit_state(dir.path(), &record(session, "abandoned")).unwrap();

    let deleted = sweep_stale(dir.path(), Duration::ZERO).unwrap();

    assert_eq!(deleted, 1);
    assert!(take_pre_edit_state(dir.path(), session, "abandoned").is_none());
}

#[test]
fn sweep_never_touches_hidden_or_lock_files() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_dir(dir.path());
    fs::create_dir_all(&state).unwrap();
    fs::write(state.join(".keyfile"), "hidden").unwrap();
    fs::write(state.join("session.lock"), "held").unwrap();
    fs::write(state.join("stale.json"), "{}").unwrap();

    let deleted = sweep_stale(dir.path(), Duration::ZERO).unwrap();

    assert_eq!(deleted, 1);
    assert!(state.join(".keyfile").exists());
    assert!(state.join("session.lock").exists());
}

#[test]
fn sweep_outside_any_state_dir_is_harmless() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(sweep_stale(dir.path(), Duration::ZERO).unwrap(), 0);
    // The sweep must not conjure a state directory into existence.
    assert!(!state_dir(dir.path()).exists());
}
