//! EditTrace - AI coding session tracer.
//!
//! This binary is wired into an AI coding assistant's tool hooks. The
//! pre-tool hook captures a "before" snapshot of the repository; the
//! post-tool hook captures the "after" snapshot, diffs the two, anchors the
//! reported edits, and appends a trace event to the repository's trace sink.
//!
//! # Commands
//!
//! - `edittrace hook --provider <name> --event <pre-tool|post-tool>`: process
//!   a hook payload from stdin
//! - `edittrace context [dir]`: print the detected VCS context as JSON
//! - `edittrace gc [dir]`: sweep stale state files
//!
//! # Environment Variables
//!
//! See the [`config`](edittrace::config) and [`paths`](edittrace::paths)
//! modules for available configuration options.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use edittrace::config::Config;
use edittrace::emitter::TraceSink;
use edittrace::ignore::{IgnorePolicy, PolicyDecision};
use edittrace::paths::{resolve_workspace_root, to_relative_path};
use edittrace::position::compute_range_positions;
use edittrace::providers::{Provider, ToolEvent};
use edittrace::redact::REDACTION_MARKER;
use edittrace::state::{save_pre_edit_state, sweep_stale, take_pre_edit_state, PreEditState};
use edittrace::types::{FileDiff, NormalizedDiff, TraceEvent, TracePayload};
use edittrace::vcs::{detect_vcs_context, provider_for, DiffOptions};
use edittrace::IgnoreConfig;

/// EditTrace - AI coding session tracer.
///
/// Captures before/after repository snapshots around assistant tool calls
/// and emits line-accurate trace events, without touching the working tree
/// or version-control state.
#[derive(Parser, Debug)]
#[command(name = "edittrace")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    EDITTRACE_WORKSPACE_ROOT   Workspace root override
    EDITTRACE_SOURCE_ID        Event source identifier (default: hostname)
    EDITTRACE_STATE_TTL_HOURS  State GC age cutoff (default: 24)

EXAMPLES:
    # Wire into a Claude Code PreToolUse hook
    edittrace hook --provider claude --event pre-tool < payload.json

    # Inspect the detected VCS context
    edittrace context ~/src/my-project

    # Sweep stale state files
    edittrace gc
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Process a hook payload from stdin.
    ///
    /// Reads the provider's hook JSON from stdin and either records a
    /// "before" snapshot (pre-tool) or diffs, anchors, and emits a trace
    /// event (post-tool).
    Hook {
        /// Which assistant produced the payload (claude, cursor, opencode).
        #[arg(short, long)]
        provider: String,

        /// Which hook fired.
        #[arg(short, long)]
        event: HookEvent,
    },

    /// Print the detected VCS context for a directory as JSON.
    Context {
        /// Directory to probe (default: resolved workspace root).
        dir: Option<PathBuf>,
    },

    /// Sweep stale state files under the repository's state directory.
    Gc {
        /// Repository root (default: resolved workspace root).
        dir: Option<PathBuf>,
    },
}

/// The two hook phases the tracer participates in.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum HookEvent {
    /// Before the tool runs: capture the "before" snapshot.
    PreTool,
    /// After the tool ran: diff, anchor, and emit.
    PostTool,
}

fn main() -> Result<()> {
    // Log to stderr so hook stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Hook { provider, event } => run_hook(&provider, event),
        Command::Context { dir } => run_context(dir),
        Command::Gc { dir } => run_gc(dir),
    }
}

/// Runs the hook command: payload from stdin, trace side effects on disk.
fn run_hook(provider_name: &str, event: HookEvent) -> Result<()> {
    let Some(provider) = Provider::from_name(provider_name) else {
        let known: Vec<&str> = Provider::ALL.iter().map(|p| p.name()).collect();
        bail!("unknown provider '{provider_name}' (expected one of: {})", known.join(", "));
    };

    let payload = read_payload()?;
    let Some(tool_event) = provider.adapt(&payload) else {
        // Not a tool invocation this adapter understands; nothing to trace.
        debug!(provider = provider.name(), "payload did not adapt, skipping");
        return Ok(());
    };

    let root = resolve_root(tool_event.cwd.as_deref());

    match event {
        HookEvent::PreTool => run_pre_tool(provider, &payload, &tool_event, &root),
        HookEvent::PostTool => run_post_tool(provider, &payload, &tool_event, &root),
    }
}

/// Pre-tool: capture the "before" snapshot and persist the handoff record.
fn run_pre_tool(
    provider: Provider,
    payload: &Value,
    tool_event: &ToolEvent,
    root: &Path,
) -> Result<()> {
    let Some(snapshot_provider) = provider_for(root) else {
        debug!(root = %root.display(), "no snapshot provider, skipping pre-tool capture");
        return Ok(());
    };

    let pre_tree = snapshot_provider
        .capture_snapshot(root)
        .context("failed to capture pre-tool snapshot")?;

    let context = detect_vcs_context(root);
    let record = PreEditState {
        vcs: context.vcs,
        repo_root: root.to_path_buf(),
        pre_tree,
        created_at: chrono::Utc::now(),
        pid: std::process::id(),
        provider: provider.name().to_string(),
        session_id: provider.session_id_for(payload),
        tool_call_id: tool_event.tool_call_id.clone(),
    };
    save_pre_edit_state(root, &record).context("failed to persist pre-edit state")?;

    debug!(tool = %tool_event.tool_name, tree = %record.pre_tree, "pre-tool snapshot recorded");
    Ok(())
}

/// Post-tool: snapshot, diff, anchor, police, emit.
fn run_post_tool(
    provider: Provider,
    payload: &Value,
    tool_event: &ToolEvent,
    root: &Path,
) -> Result<()> {
    let config = Config::from_env()?;
    let policy = IgnorePolicy::new(root.to_path_buf(), IgnoreConfig::load(root));
    let sink = TraceSink::new(root);

    let session_id = provider.session_id_for(payload);
    let pre_state = take_pre_edit_state(root, session_id, &tool_event.tool_call_id);

    // Policy check on the directly edited path comes first: a skipped path
    // must not even reach the diff stage of the event.
    let edited_rel_path = tool_event
        .file_path
        .as_deref()
        .and_then(|p| to_relative_path(p, root));
    if let Some(rel) = &edited_rel_path {
        if policy.decide(rel) == PolicyDecision::Skip {
            info!(path = %rel, "edit skipped by redaction policy");
            let event = TraceEvent::new(
                config.source_id,
                TracePayload::Skipped {
                    session_id,
                    tool_call_id: tool_event.tool_call_id.clone(),
                    tool: tool_event.tool_name.clone(),
                    reason: "path matched skip policy".to_string(),
                },
            );
            return sink.append(&event).context("failed to append trace event");
        }
    }

    let diff = compute_diff(pre_state.as_ref(), root, config.include_patch)?;
    let files = apply_policy(&policy, root, diff);

    // Position anchors are content hashes plus line numbers; no raw edit
    // text survives into them, so they are safe even for redacted paths.
    let file_content = tool_event
        .file_path
        .as_deref()
        .and_then(|p| std::fs::read_to_string(p).ok());
    let positions = compute_range_positions(&tool_event.edits, file_content.as_deref());

    let vcs = match pre_state {
        Some(state) => state.vcs,
        None => detect_vcs_context(root).vcs,
    };

    let event = TraceEvent::new(
        config.source_id,
        TracePayload::ToolTrace {
            session_id,
            tool_call_id: tool_event.tool_call_id.clone(),
            tool: tool_event.tool_name.clone(),
            provider: provider.name().to_string(),
            vcs,
            files,
            positions,
        },
    );
    sink.append(&event).context("failed to append trace event")?;

    info!(tool = %tool_event.tool_name, id = %event.id, "trace event emitted");
    Ok(())
}

/// Diffs the persisted "before" snapshot against a fresh "after" snapshot.
///
/// Without a pre-edit record (lost, swept, or the pre-hook never ran) there
/// is nothing to diff against; the event still carries its positions.
fn compute_diff(
    pre_state: Option<&PreEditState>,
    root: &Path,
    include_patch: bool,
) -> Result<NormalizedDiff> {
    let Some(pre_state) = pre_state else {
        warn!("no pre-edit state found, emitting event without file diffs");
        return Ok(NormalizedDiff::default());
    };
    let Some(snapshot_provider) = provider_for(root) else {
        warn!(root = %root.display(), "no snapshot provider, emitting event without file diffs");
        return Ok(NormalizedDiff::default());
    };

    let post_tree = snapshot_provider
        .capture_snapshot(root)
        .context("failed to capture post-tool snapshot")?;
    let diff = snapshot_provider
        .diff_snapshots(&pre_state.pre_tree, &post_tree, root, &DiffOptions { include_patch })
        .context("failed to diff snapshots")?;

    debug!(
        from = %pre_state.pre_tree,
        to = %post_tree,
        files = diff.files.len(),
        "snapshots diffed"
    );
    Ok(diff)
}

/// Applies the per-path policy to every file in the diff.
///
/// Skipped paths drop out of the event entirely; redacted paths keep their
/// status, hunks, and positions but lose raw patch text.
fn apply_policy(policy: &IgnorePolicy, root: &Path, diff: NormalizedDiff) -> Vec<FileDiff> {
    diff.files
        .into_iter()
        .filter_map(|mut file| match policy.decide(&file.path) {
            PolicyDecision::Allow => Some(file),
            PolicyDecision::Redact => {
                file.hunk_patch = file.hunk_patch.map(|_| REDACTION_MARKER.to_string());
                file.patch = file.patch.map(|_| REDACTION_MARKER.to_string());
                Some(file)
            }
            PolicyDecision::Skip => {
                debug!(path = %file.path, root = %root.display(), "file dropped by skip policy");
                None
            }
        })
        .collect()
}

/// Resolves the repository root for a hook invocation.
///
/// The payload's working directory anchors detection when present; the
/// workspace-root environment precedence is the fallback.
fn resolve_root(cwd: Option<&Path>) -> PathBuf {
    let start = cwd.map(Path::to_path_buf).unwrap_or_else(resolve_workspace_root);
    detect_vcs_context(&start).root
}

/// Prints the detected VCS context for a directory as JSON.
fn run_context(dir: Option<PathBuf>) -> Result<()> {
    let start = dir.unwrap_or_else(resolve_workspace_root);
    let context = detect_vcs_context(&start);
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

/// Sweeps stale state files for a repository root.
fn run_gc(dir: Option<PathBuf>) -> Result<()> {
    let config = Config::from_env()?;
    let root = resolve_root(dir.as_deref());
    let ttl = std::time::Duration::from_secs(config.state_ttl_hours * 3600);

    let deleted = sweep_stale(&root, ttl).context("state sweep failed")?;
    info!(root = %root.display(), deleted, "state sweep complete");
    println!("swept {deleted} stale state file(s)");
    Ok(())
}

/// Reads and parses the hook payload from stdin.
fn read_payload() -> Result<Value> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read hook payload from stdin")?;

    let payload: Value =
        serde_json::from_str(&raw).context("hook payload is not valid JSON")?;
    if !payload.is_object() {
        bail!("hook payload must be a JSON object");
    }
    Ok(payload)
}
