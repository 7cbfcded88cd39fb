// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The post-tool bookkeeper.
//!
//! Runs after every tool completes: mode transitions driven by todo
//! completion, stash restoration, one-shot ticket revocation, file
//! ownership release on sub-task end, task re-parse on edit, and the
//! working-directory breadcrumb.

use ccs_core::{
    is_file_writer, HookOutcome, HookPayload, Mode, Protocol, SessionsState,
};
use ccs_shell::{split_segments, tokenize, Token};

use crate::ctx::{EnforceCtx, EngineError};
use crate::resolve::resolve_nonstrict;

/// The PostToolUse entry point.
pub fn post_tool_use(ctx: &EnforceCtx, payload: &HookPayload) -> Result<HookOutcome, EngineError> {
    let state = ctx.state.load()?;
    let tool = payload.tool_name().to_string();
    let mut stderr = Vec::new();

    // A one-shot ticket is consumed by exactly one CLI invocation; any
    // other tool use revokes it.
    if state.flags.api.todos_clear && !is_todos_clear_invocation(payload) {
        ctx.state.edit(|s| s.flags.api.todos_clear = false)?;
    }

    match tool.as_str() {
        "Bash" => {
            if command_changes_directory(payload.command().unwrap_or("")) {
                if let Some(cwd) = payload.cwd.as_deref() {
                    stderr.push(format!("[ccs] cwd: {cwd}"));
                }
            }
        }
        "Task" if state.flags.subagent => {
            finish_subagent(ctx, payload, &mut stderr)?;
        }
        "TodoWrite" => {
            if let Some(banner) = todo_completion(ctx, &state)? {
                stderr.push(banner);
            }
        }
        _ if is_file_writer(&tool) => {
            reparse_task_file(ctx, payload, &state)?;
        }
        _ => {}
    }

    // Nudge the host when orchestration mode sits idle on a task.
    let state = ctx.state.load()?;
    if state.mode == Mode::Orchestration
        && !state.flags.subagent
        && state.todos.active.is_empty()
        && state.current_task.is_set()
    {
        let name = state.current_task.name.as_deref().unwrap_or("current task");
        stderr.push(format!(
            "[ccs] Reminder: {name} is active with no todo list. Propose \
             todos or run the completion protocol.",
        ));
    }

    Ok(if stderr.is_empty() {
        HookOutcome::allow()
    } else {
        HookOutcome::allow_with_stderr(stderr.join("\n"))
    })
}

/// True when a Bash segment invokes `cd`.
fn command_changes_directory(command: &str) -> bool {
    let tokens = tokenize(command);
    split_segments(&tokens).iter().any(|segment| {
        segment.iter().find_map(|t| match t {
            Token::Word(w) => Some(w.text == "cd"),
            _ => None,
        }) == Some(true)
    })
}

fn is_todos_clear_invocation(payload: &HookPayload) -> bool {
    if payload.tool_name() != "Bash" {
        return false;
    }
    let command = payload.command().unwrap_or("");
    let mut words = command.split_whitespace();
    let head = words.next().unwrap_or("");
    let head = head.rsplit('/').next().unwrap_or(head);
    head == "ccs" && words.next() == Some("todos") && words.next() == Some("clear")
}

/// Sub-task end: release ownership, clear the flag, drop the chunks.
fn finish_subagent(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    stderr: &mut Vec<String>,
) -> Result<(), EngineError> {
    let agent_id = payload
        .input_str("task_id")
        .or_else(|| payload.input_str("subagent_type"))
        .unwrap_or("shared")
        .to_string();
    let target = payload
        .input_str("subagent_type")
        .unwrap_or("shared")
        .to_string();

    let released = ctx.state.edit(|state| {
        let released = state.execution_windows.release_owned_by(&agent_id);
        state.flags.clear_subagent();
        released
    })?;
    if released > 0 {
        stderr.push(format!("[ccs] released {released} file ownership window(s)"));
    }

    let dir = ctx.paths.transcript_target_dir(&target);
    if dir.exists() {
        let _ = std::fs::remove_dir_all(&dir);
    }
    Ok(())
}

/// TodoWrite aftermath: when every active todo is completed, decide what
/// the session does next.
fn todo_completion(
    ctx: &EnforceCtx,
    state: &SessionsState,
) -> Result<Option<String>, EngineError> {
    // Re-read: the TodoWrite that just ran may have updated statuses.
    let fresh = ctx.state.load()?;
    if fresh.mode != Mode::Orchestration || !fresh.todos.all_completed() {
        return Ok(None);
    }

    if state.active_protocol == Some(Protocol::Completion) {
        ctx.state.edit(|s| {
            s.mode = Mode::Discussion;
            s.active_protocol = None;
            s.current_task.clear();
            s.todos.active.clear();
            s.todos.stashed.clear();
            s.todos.parent_snapshot = None;
        })?;
        return Ok(Some(format!(
            "[ccs] Task complete. Back to discussion mode.\n{}",
            open_tasks_help(ctx),
        )));
    }

    if !fresh.todos.stashed.is_empty() {
        ctx.state.edit(|s| {
            s.todos.active = std::mem::take(&mut s.todos.stashed);
            s.flags.api.todos_clear = true;
        })?;
        return Ok(Some(format!(
            "[ccs] All todos complete. Restored the stashed list from the \
             parent context. To discard it instead, run: {}",
            todos_clear_hint(ctx),
        )));
    }

    ctx.state.edit(|s| {
        s.todos.active.clear();
        s.mode = Mode::Discussion;
    })?;
    Ok(Some(
        "[ccs] All todos complete. Back to discussion mode.".to_string(),
    ))
}

/// OS-appropriate invocation of the clearing CLI.
fn todos_clear_hint(ctx: &EnforceCtx) -> String {
    if ctx.config.environment.os.to_ascii_lowercase().contains("windows") {
        "ccs.exe todos clear".to_string()
    } else {
        "ccs todos clear".to_string()
    }
}

fn open_tasks_help(ctx: &EnforceCtx) -> String {
    let tasks_dir = ctx.paths.tasks_dir();
    let mut names: Vec<String> = std::fs::read_dir(&tasks_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| name.ends_with(".md"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    if names.is_empty() {
        format!("No open tasks in {}.", tasks_dir.display())
    } else {
        format!("Open tasks:\n  {}", names.join("\n  "))
    }
}

/// An edit that touched the current task's own file re-parses its
/// frontmatter into state.
fn reparse_task_file(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    state: &SessionsState,
) -> Result<(), EngineError> {
    let Some(task_file) = state.current_task.file.as_deref() else {
        return Ok(());
    };
    let Some(edited) = payload.file_path() else {
        return Ok(());
    };

    let root = ctx.paths.root();
    let edited = resolve_nonstrict(edited, root);
    let task_path = resolve_nonstrict(task_file, root);
    if edited != task_path {
        return Ok(());
    }

    let Ok(text) = std::fs::read_to_string(&task_path) else {
        return Ok(());
    };
    let Some(frontmatter) = ccs_core::parse_frontmatter(&text) else {
        return Ok(());
    };
    ctx.state.edit(|s| {
        s.current_task.apply_frontmatter(&frontmatter);
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "bookkeeper_tests.rs"]
mod tests;
