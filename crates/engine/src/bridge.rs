// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External sub-process bridges.
//!
//! The backlog bridge and the reasoning extractor are opaque child
//! processes with a JSON contract. A missing or failing bridge degrades
//! to a no-op with a single log line; it never fails the hook.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use thiserror::Error;

use crate::subprocess::{run_with_timeout, BRIDGE_TIMEOUT};

/// Errors from bridge invocations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge unavailable: {0}")]
    Unavailable(String),

    #[error("bridge exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("bridge produced invalid JSON: {0}")]
    BadOutput(#[from] serde_json::Error),
}

/// Parsed bridge response.
#[derive(Debug, Clone)]
pub struct BridgeResult {
    /// e.g. `execute_plan:group-G3`, `execute_plan:halt`, `none`.
    pub signal: String,
    /// The full response payload.
    pub payload: Value,
}

/// Arguments for the sub-agent stop bridge call.
#[derive(Debug, Clone)]
pub struct StopBridgeArgs<'a> {
    pub session_id: &'a str,
    pub task_id: &'a str,
    pub group_id: &'a str,
    pub subagent_type: &'a str,
    pub exit_status: &'a str,
    pub state_dir: &'a Path,
    pub tasks_dir: &'a Path,
}

/// Invoke the backlog bridge for a sub-agent stop event.
///
/// `SESSIONS_STATE_DIR` / `BACKLOG_TASKS_DIR` override the directories
/// passed on the command line. The call is bounded: a stuck bridge is
/// killed and degrades to a no-op rather than wedging the hook.
pub fn backlog_subagent_stop(args: &StopBridgeArgs<'_>) -> Result<BridgeResult, BridgeError> {
    let state_dir = std::env::var("SESSIONS_STATE_DIR")
        .unwrap_or_else(|_| args.state_dir.to_string_lossy().into_owned());
    let tasks_dir = std::env::var("BACKLOG_TASKS_DIR")
        .unwrap_or_else(|_| args.tasks_dir.to_string_lossy().into_owned());

    let mut cmd = Command::new("python3");
    cmd.args([
        "-m",
        "sessions.bin.backlog_bridge",
        "subagent-stop",
        "--session-id",
        args.session_id,
        "--task-id",
        args.task_id,
        "--group-id",
        args.group_id,
        "--subagent-type",
        args.subagent_type,
        "--exit-status",
        args.exit_status,
        "--state-dir",
        &state_dir,
        "--tasks-dir",
        &tasks_dir,
    ]);
    let output = run_with_timeout(cmd, BRIDGE_TIMEOUT, "backlog bridge")
        .map_err(BridgeError::Unavailable)?;

    if !output.status.success() {
        return Err(BridgeError::Failed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let payload: Value = serde_json::from_slice(&output.stdout)?;
    let signal = payload
        .get("signal")
        .and_then(Value::as_str)
        .unwrap_or("none")
        .to_string();
    Ok(BridgeResult { signal, payload })
}

/// Fire-and-forget the reasoning extractor with the trajectory on stdin.
///
/// The child is detached: we neither wait for it nor look at its exit
/// status. Any failure to spawn or feed it is swallowed after a log line.
pub fn spawn_reasoning_extractor(
    task_id: &str,
    group_id: &str,
    success: bool,
    trajectory: &str,
) -> Result<(), BridgeError> {
    let outcome = if success { "success" } else { "failure" };
    let mut child = Command::new("python3")
        .args([
            "-m",
            "reasoning_bank.cli",
            "extract",
            "--task-id",
            task_id,
            "--outcome",
            outcome,
            "--group-id",
            group_id,
            "--trajectory-stdin",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| BridgeError::Unavailable(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(trajectory.as_bytes());
    }
    // Dropping the child handle leaves it running detached.
    Ok(())
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
