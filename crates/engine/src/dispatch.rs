// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sub-agent dispatch pipeline.
//!
//! Pre-dispatch (before a Task tool fires): claim file ownership, mark
//! the sub-agent flag, and slice the conversation transcript into
//! byte-bounded chunks under an exclusive per-target lock.
//!
//! Post-stop (SubagentStop): recover the dispatch identity from the
//! transcript tail, call the backlog bridge, and fold its signal into the
//! execution plan under the state lock. Bridge failures leave the plan
//! untouched and never poison the host session.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ccs_core::{GroupStatus, HookOutcome, HookPayload, TaskWindow, WindowStatus};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::bridge::{self, StopBridgeArgs};
use crate::ctx::{EnforceCtx, EngineError};
use crate::transcript::{chunk_text, TranscriptEntry};

/// Maximum size of one transcript chunk.
pub const TRANSCRIPT_CHUNK_BYTES: usize = 24_000;

/// Wait budget for the per-target dispatch lock.
const TARGET_LOCK_WAIT: Duration = Duration::from_secs(8);

/// Poll interval while waiting on the per-target lock.
const TARGET_LOCK_POLL: Duration = Duration::from_millis(100);

/// Tool names whose first appearance anchors the transcript slice.
const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit"];

/// Pre-dispatch: ownership, flags, transcript slicing.
///
/// `owning_group` is the validated execution-plan group recorded back
/// into state, when plan validation ran.
pub fn pre_dispatch(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    owning_group: Option<String>,
) -> Result<HookOutcome, EngineError> {
    let session_id = payload.session_id().to_string();
    let subagent_type = payload
        .input_str("subagent_type")
        .unwrap_or("shared")
        .to_string();
    let task_id = payload.input_str("task_id").map(str::to_string);
    let agent_id = task_id.clone().unwrap_or_else(|| subagent_type.clone());
    let declared_files = declared_files(payload);
    let window_seed = window_seed(ctx, task_id.as_deref());

    // Without a transcript there is no dispatch to prepare; record the
    // validated group and let the tool proceed.
    let Some(transcript_path) = payload.transcript_path.clone() else {
        if let Some(group) = owning_group {
            ctx.state
                .edit(|s| s.metadata.orchestration.active_group_id = Some(group.clone()))?;
        }
        return Ok(HookOutcome::allow());
    };

    // Ownership claim and flag set, one critical section.
    let conflict = ctx.state.edit(|state| {
        if let Some(group) = &owning_group {
            state.metadata.orchestration.active_group_id = Some(group.clone());
        }

        if !declared_files.is_empty() {
            if let Some(holder) = state
                .execution_windows
                .conflicting_window(&declared_files, Some(&agent_id))
            {
                let owner = holder.assigned_to.clone().unwrap_or_default();
                let overlap: Vec<String> = holder
                    .assigned_files
                    .iter()
                    .filter(|f| declared_files.contains(f))
                    .cloned()
                    .collect();
                let now = chrono::Utc::now().to_rfc3339();
                let window = upsert_window(state, &agent_id, &window_seed);
                window.conflict_detected = true;
                window.conflict_with = Some(owner.clone());
                window.conflict_files = overlap.clone();
                window.conflict_at = Some(now);
                return Some((owner, overlap));
            }

            let now = chrono::Utc::now().to_rfc3339();
            let window = upsert_window(state, &agent_id, &window_seed);
            window.status = WindowStatus::InProgress;
            window.assigned_to = Some(agent_id.clone());
            window.assigned_files = declared_files.clone();
            window.assigned_at = Some(now);
            window.conflict_detected = false;
            window.conflict_with = None;
            window.conflict_files.clear();
            window.conflict_at = None;
        }

        state.flags.subagent = true;
        state.flags.subagent_session_id = Some(session_id.clone());
        None
    })?;

    if let Some((owner, files)) = conflict {
        return Ok(HookOutcome::block(format!(
            "File ownership conflict: {} already assigned to {owner}. \
             Dispatch blocked; first writer wins.",
            files.join(", "),
        )));
    }

    match slice_transcript(ctx, Path::new(&transcript_path), &subagent_type) {
        Ok(chunks) => {
            debug!(dispatch_target = %subagent_type, chunks, "transcript sliced");
            Ok(HookOutcome::allow())
        }
        Err(EngineError::TranscriptLockTimeout { target }) => {
            ctx.oplog.error(
                "dispatch",
                "transcript lock timeout",
                serde_json::json!({"target": target}),
            );
            Err(EngineError::TranscriptLockTimeout { target })
        }
        Err(EngineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            // Transcript not materialized yet; nothing to slice.
            Ok(HookOutcome::allow())
        }
        Err(e) => Err(e),
    }
}

fn declared_files(payload: &HookPayload) -> Vec<String> {
    payload
        .tool_input
        .as_ref()
        .and_then(|input| input.get("files"))
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Task-file metadata captured into a fresh ownership record.
struct WindowSeed {
    file: String,
    branch: Option<String>,
    content_hash: Option<String>,
    mtime: Option<i64>,
}

fn window_seed(ctx: &EnforceCtx, task_id: Option<&str>) -> WindowSeed {
    let Some(task_id) = task_id else {
        return WindowSeed {
            file: String::new(),
            branch: None,
            content_hash: None,
            mtime: None,
        };
    };
    let relative = format!("sessions/tasks/{task_id}.md");
    let absolute = ctx.paths.root().join(&relative);
    let content_hash = std::fs::read(&absolute)
        .ok()
        .map(|bytes| format!("{:x}", Sha256::digest(&bytes)));
    let mtime = std::fs::metadata(&absolute)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64);
    let branch = content_hash
        .is_some()
        .then(|| {
            std::fs::read_to_string(&absolute)
                .ok()
                .and_then(|text| ccs_core::parse_frontmatter(&text))
                .and_then(|fm| fm.branch)
        })
        .flatten();
    WindowSeed {
        file: relative,
        branch,
        content_hash,
        mtime,
    }
}

fn upsert_window<'a>(
    state: &'a mut ccs_core::SessionsState,
    agent_id: &str,
    seed: &WindowSeed,
) -> &'a mut TaskWindow {
    let key = if seed.file.is_empty() {
        agent_id.to_string()
    } else {
        seed.file.clone()
    };
    let windows = &mut state.execution_windows.tasks;
    let index = windows.iter().position(|w| w.file == key);
    let index = match index {
        Some(i) => i,
        None => {
            windows.push(TaskWindow {
                file: key,
                branch: seed.branch.clone(),
                content_hash: seed.content_hash.clone(),
                mtime: seed.mtime,
                ..Default::default()
            });
            windows.len() - 1
        }
    };
    &mut windows[index]
}

/// Slice the transcript for `target` under its exclusive lock. Returns
/// the number of chunks written.
fn slice_transcript(
    ctx: &EnforceCtx,
    transcript_path: &Path,
    target: &str,
) -> Result<usize, EngineError> {
    let (entries, cache_hit) = ctx.transcript_tails.read(transcript_path, 1)?;
    debug!(cache_hit_transcript = cache_hit, "transcript tail read");
    let retained = trim_entries(&entries);

    let lock_path = ctx.paths.transcript_lock_file(target);
    let _lock = TargetLock::acquire(&lock_path, TARGET_LOCK_WAIT).ok_or(
        EngineError::TranscriptLockTimeout {
            target: target.to_string(),
        },
    )?;

    let raw: Vec<&Value> = retained.iter().map(|e| &e.raw).collect();
    let body = serde_json::to_string_pretty(&raw)?;
    let chunks = chunk_text(&body, TRANSCRIPT_CHUNK_BYTES);

    let dir = ctx.paths.transcript_target_dir(target);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    for (i, chunk) in chunks.iter().enumerate() {
        std::fs::write(dir.join(format!("current_transcript_{i:03}.txt")), chunk)?;
    }
    Ok(chunks.len())
}

/// Drop everything before the first Edit/Write/MultiEdit tool_use, then
/// keep only user/assistant messages.
fn trim_entries(entries: &[TranscriptEntry]) -> Vec<&TranscriptEntry> {
    let start = entries
        .iter()
        .position(|entry| {
            entry
                .tool_use_names()
                .iter()
                .any(|name| EDIT_TOOLS.contains(name))
        })
        .unwrap_or(0);
    entries[start..].iter().filter(|e| e.is_message()).collect()
}

/// Exclusive per-target lock: an `O_EXCL`-created file holding our pid.
struct TargetLock {
    path: PathBuf,
}

impl TargetLock {
    fn acquire(path: &Path, wait: Duration) -> Option<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let deadline = Instant::now() + wait;
        loop {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
            {
                Ok(mut file) => {
                    use std::io::Write;
                    let _ = write!(file, "{}", std::process::id());
                    return Some(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    std::thread::sleep(TARGET_LOCK_POLL);
                }
                Err(_) => return None,
            }
        }
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// SubagentStop: bridge the stop event into the execution plan.
pub fn subagent_stop(ctx: &EnforceCtx, payload: &HookPayload) -> Result<HookOutcome, EngineError> {
    // Only Task completions matter here.
    if let Some(tool) = payload.tool_name.as_deref() {
        if tool != "Task" {
            return Ok(HookOutcome::allow());
        }
    }
    let Some(transcript_path) = payload.transcript_path.as_deref() else {
        return Ok(HookOutcome::allow());
    };

    let entries = match ctx.transcript_tails.read(Path::new(transcript_path), 1) {
        Ok((entries, _cache_hit)) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HookOutcome::allow()),
        Err(e) => return Err(e.into()),
    };
    let Some(task_input) = entries
        .iter()
        .rev()
        .find_map(|entry| entry.tool_use_input("Task").cloned())
    else {
        debug!("no Task tool_use in transcript tail; ignoring stop event");
        return Ok(HookOutcome::allow());
    };

    let task_id = task_input
        .get("task_id")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let group_id = task_input
        .get("group_id")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let subagent_type = task_input
        .get("subagent_type")
        .and_then(Value::as_str)
        .unwrap_or("shared")
        .to_string();
    let exit_status = normalize_exit_status(payload);

    let state_dir = ctx.paths.shared_state_dir();
    let tasks_dir = ctx.paths.tasks_dir();
    let result = bridge::backlog_subagent_stop(&StopBridgeArgs {
        session_id: payload.session_id(),
        task_id: &task_id,
        group_id: &group_id,
        subagent_type: &subagent_type,
        exit_status: &exit_status,
        state_dir: &state_dir,
        tasks_dir: &tasks_dir,
    });

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            // Plan stays untouched; the host session must not be poisoned.
            ctx.oplog.error(
                "dispatch",
                "backlog bridge failed",
                serde_json::json!({
                    "task_id": task_id,
                    "group_id": group_id,
                    "error": e.to_string(),
                }),
            );
            return Ok(HookOutcome::allow());
        }
    };

    let session_id = payload.session_id().to_string();
    let completed = exit_status == "completed";
    ctx.state.edit(|state| {
        let orchestration = &mut state.metadata.orchestration;
        orchestration.last_signal = Some(result.signal.clone());
        orchestration.last_signal_at = Some(chrono::Utc::now().to_rfc3339());
        orchestration.last_session_id = Some(session_id.clone());
        orchestration.last_group_id = Some(group_id.clone());
        orchestration.last_task_id = Some(task_id.clone());
        orchestration.last_exit_status = Some(exit_status.clone());
        orchestration.last_payload = Some(result.payload.clone());

        if let Some(plan) = orchestration.execution_plan.as_mut() {
            if let Some(group) = plan.group_mut(&group_id) {
                group.status = if completed {
                    GroupStatus::Completed
                } else {
                    GroupStatus::Failed
                };
            }
            if let Some(next) = result.signal.strip_prefix("execute_plan:group-") {
                if let Some(group) = plan.group_mut(next) {
                    if group.status == GroupStatus::Failed {
                        group.status = GroupStatus::Pending;
                    }
                }
            }
        }
    })?;

    // Best-effort reasoning extraction; never blocks, exit ignored.
    let trajectory: Vec<&Value> = entries.iter().map(|e| &e.raw).collect();
    if let Ok(trajectory) = serde_json::to_string(&trajectory) {
        if let Err(e) = bridge::spawn_reasoning_extractor(&task_id, &group_id, completed, &trajectory)
        {
            ctx.oplog.warn(
                "dispatch",
                "reasoning extractor unavailable",
                serde_json::json!({"error": e.to_string()}),
            );
        }
    }

    Ok(HookOutcome::allow())
}

/// Missing status means a clean completion; anything else is folded to
/// lowercase for comparison.
fn normalize_exit_status(payload: &HookPayload) -> String {
    let raw = payload
        .exit_status
        .as_deref()
        .or_else(|| {
            payload
                .tool_response
                .as_ref()?
                .get("exit_status")?
                .as_str()
        })
        .unwrap_or("");
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "completed".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
