// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool gate: the PreToolUse decision engine.
//!
//! Checks run in a fixed order and short-circuit on the first decision:
//!
//! 1. stale sub-agent flag cleanup
//! 2. Task dispatch validation (nested ban, execution-plan checks)
//! 3. Bash command taxonomy in discussion mode
//! 4. orchestration-state protection against sub-agents
//! 5. discussion-mode tool blocklist
//! 6. todo tamper detection
//! 7. task/branch consistency

use ccs_core::{
    is_file_writer, GroupStatus, HookOutcome, HookPayload, Mode, SessionsState, Todo,
};
use ccs_shell::{is_read_only, write_targets};
use tracing::debug;

use crate::ctx::{EnforceCtx, EngineError};
use crate::dispatch;
use crate::git::enclosing_work_tree;
use crate::resolve::{is_protected_path, resolve_nonstrict};

/// Environment variables that mark a CI run; gating is disabled there.
const CI_ENV_VARS: &[&str] = &["CI", "GITHUB_ACTIONS", "CONTINUOUS_INTEGRATION"];

/// The PreToolUse entry point.
pub fn pre_tool_use(ctx: &EnforceCtx, payload: &HookPayload) -> Result<HookOutcome, EngineError> {
    if in_ci() {
        return Ok(HookOutcome::allow());
    }

    let mut state = ctx.state.load()?;
    let tool = payload.tool_name().to_string();

    // 1. A sub-agent flag owned by a vanished session is cleared, then
    // evaluation continues as if it was never set.
    if state.flags.is_subagent_stale(payload.session_id()) {
        debug!(session = payload.session_id(), "clearing stale subagent flag");
        state = ctx.state.edit(|s| {
            s.flags.clear_subagent();
            s.clone()
        })?;
    }

    // 2. Task dispatch gate.
    if tool == "Task" {
        return task_dispatch_gate(ctx, payload, &state);
    }

    // 3. Bash in discussion mode: decide by the command taxonomy.
    if state.mode == Mode::Discussion && !state.flags.bypass_mode && tool == "Bash" {
        let command = payload.command().unwrap_or("");
        if is_own_cli(command) {
            return Ok(HookOutcome::allow_with_decision("cc-sessions CLI command"));
        }
        if is_read_only(command, &ctx.classify_options()) {
            return Ok(HookOutcome::allow_with_decision(
                "read-only command permitted in discussion mode",
            ));
        }
        return Ok(HookOutcome::block(discussion_bash_block(ctx, command)));
    }

    // 4. Sub-agents may not touch orchestration state.
    if state.flags.subagent {
        if let Some(outcome) = subagent_state_protection(ctx, payload, &tool) {
            return Ok(outcome);
        }
    }

    // 5. Discussion-mode tool blocklist.
    if state.mode == Mode::Discussion
        && !state.flags.bypass_mode
        && ctx.config.is_blocked_tool(&tool)
    {
        return Ok(HookOutcome::block(format!(
            "[DAIC: Discussion Mode] Blocked tool: {tool}. Implementation tools are \
             disabled until the user switches modes (trigger phrases: {}).",
            ctx.config.trigger_phrases.orchestration_mode.join(", "),
        )));
    }

    // 6. Todo tamper check.
    if tool == "TodoWrite" && !state.todos.active.is_empty() {
        if let Some(outcome) = todo_tamper_check(ctx, payload, &state)? {
            return Ok(outcome);
        }
    }

    // 7. Branch / submodule consistency.
    if ctx.config.features.branch_enforcement && is_file_writer(&tool) {
        if let Some(outcome) = branch_check(ctx, payload, &state) {
            return Ok(outcome);
        }
    }

    Ok(HookOutcome::allow())
}

fn in_ci() -> bool {
    CI_ENV_VARS.iter().any(|var| {
        std::env::var(var)
            .map(|v| !v.is_empty() && v != "0" && v != "false")
            .unwrap_or(false)
    })
}

/// True when the Bash command invokes our own CLI.
fn is_own_cli(command: &str) -> bool {
    let head = command.split_whitespace().next().unwrap_or("");
    let head = head.rsplit('/').next().unwrap_or(head);
    head == "ccs"
}

fn discussion_bash_block(ctx: &EnforceCtx, command: &str) -> String {
    format!(
        "[DAIC: Discussion Mode] Blocked write-like command: {command}\n\
         Only read-only commands run in discussion mode. Switch modes with a \
         trigger phrase ({phrases}), or teach the classifier via \
         {config} (read_patterns / write_patterns).",
        phrases = ctx.config.trigger_phrases.orchestration_mode.join(", "),
        config = ctx.paths.config_file().display(),
    )
}

/// Step 2: nested-dispatch ban plus execution-plan validation, then the
/// pre-dispatch pipeline.
fn task_dispatch_gate(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    state: &SessionsState,
) -> Result<HookOutcome, EngineError> {
    // Nested dispatch is always blocked, bypass or not.
    if state.flags.subagent {
        return Ok(HookOutcome::block(
            "Sub-agents cannot spawn nested subagents. Finish the current \
             sub-task before dispatching another.",
        ));
    }

    let mut owning_group = None;
    if let (Some(plan), Some(task_id)) = (
        state.metadata.orchestration.execution_plan.as_ref(),
        payload.input_str("task_id"),
    ) {
        let orchestration = &state.metadata.orchestration;
        if let Some(session) = orchestration.session_id.as_deref() {
            if session != payload.session_id() {
                return Ok(HookOutcome::block(format!(
                    "Execution plan belongs to session {session}; dispatch from \
                     session {} rejected.",
                    payload.session_id(),
                )));
            }
        }

        let Some(group) = plan.group_of_task(task_id) else {
            return Ok(HookOutcome::block(format!(
                "Task {task_id} is not part of the active execution plan."
            )));
        };
        if group.status != GroupStatus::Running {
            return Ok(HookOutcome::block(format!(
                "Group {} is not running (status: {:?}); task {task_id} cannot \
                 be dispatched.",
                group.id, group.status,
            )));
        }
        if !plan.deps_completed(group) {
            return Ok(HookOutcome::block(format!(
                "Group {} has incomplete dependencies; task {task_id} cannot \
                 be dispatched yet.",
                group.id,
            )));
        }
        owning_group = Some(group.id.clone());
    }

    dispatch::pre_dispatch(ctx, payload, owning_group)
}

/// Step 4: block writes that resolve to protected orchestration state.
fn subagent_state_protection(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    tool: &str,
) -> Option<HookOutcome> {
    const MESSAGE: &str = "Sub-agents cannot modify orchestration state files.";

    if tool == "Bash" {
        let command = payload.command()?;
        for target in write_targets(command) {
            if is_protected_path(&target, &ctx.paths) {
                return Some(HookOutcome::block(format!(
                    "{MESSAGE} Write target: {target}"
                )));
            }
        }
        return None;
    }

    if is_file_writer(tool) {
        let file = payload.file_path()?;
        if is_protected_path(file, &ctx.paths) {
            return Some(HookOutcome::block(format!("{MESSAGE} File: {file}")));
        }
    }
    None
}

/// Step 6: reject TodoWrite proposals that alter the approved contents.
fn todo_tamper_check(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    state: &SessionsState,
) -> Result<Option<HookOutcome>, EngineError> {
    let proposed: Vec<Todo> = payload
        .tool_input
        .as_ref()
        .and_then(|input| input.get("todos"))
        .and_then(|todos| serde_json::from_value(todos.clone()).ok())
        .unwrap_or_default();

    if state.todos.contents_match(&proposed) {
        return Ok(None);
    }

    let original = state.todos.active.clone();
    ctx.state.edit(|s| {
        s.todos.parent_snapshot = Some(s.todos.active.clone());
        s.todos.active.clear();
        s.mode = Mode::Discussion;
    })?;

    let mut message = String::from(
        "[DAIC] TodoWrite rejected: the proposed list does not match the \
         approved todos. The approved list was stashed and the session \
         returned to discussion mode.\n\nApproved todos:\n",
    );
    for todo in &original {
        message.push_str(&format!("  - {}\n", todo.content));
    }
    message.push_str("\nProposed todos:\n");
    for todo in &proposed {
        message.push_str(&format!("  - {}\n", todo.content));
    }
    message.push_str(&format!(
        "\nTo work on a different list, switch modes first (trigger \
         phrases: {}).",
        ctx.config.trigger_phrases.orchestration_mode.join(", "),
    ));
    Ok(Some(HookOutcome::block(message)))
}

/// Step 7: the target's work tree must sit on the task's branch, and
/// submodule targets must be declared by the task.
fn branch_check(
    ctx: &EnforceCtx,
    payload: &HookPayload,
    state: &SessionsState,
) -> Option<HookOutcome> {
    let task_branch = state.current_task.branch.as_deref()?;
    let file = payload.file_path()?;
    let resolved = resolve_nonstrict(file, ctx.paths.root());
    let tree = enclosing_work_tree(&resolved)?;
    let branch = ctx.branches.current_branch(&tree)?;

    let root = ctx.paths.root();
    let branch_matches = branch == task_branch;

    let Ok(relative) = tree.strip_prefix(root) else {
        // Target lives outside the project; not ours to police.
        return None;
    };

    if relative.as_os_str().is_empty() {
        // Project root itself.
        return if branch_matches {
            None
        } else {
            Some(HookOutcome::block(format!(
                "Branch mismatch: task expects {task_branch} but the project \
                 is on {branch}. Run: git checkout {task_branch}",
            )))
        };
    }

    let submodule = relative.to_string_lossy().to_string();
    let in_task = state.current_task.submodules.contains(&submodule)
        || relative
            .file_name()
            .map(|n| {
                state
                    .current_task
                    .submodules
                    .contains(&n.to_string_lossy().to_string())
            })
            .unwrap_or(false);

    match (in_task, branch_matches) {
        (true, true) => None,
        (true, false) => Some(HookOutcome::block(format!(
            "Branch mismatch in submodule {submodule}: task expects \
             {task_branch} but it is on {branch}. Run: git -C {submodule} \
             checkout {task_branch}",
        ))),
        (false, true) => Some(HookOutcome::block(format!(
            "Submodule {submodule} is not listed in the current task. Add it \
             to the task file's submodules before editing files there.",
        ))),
        (false, false) => Some(HookOutcome::block(format!(
            "Submodule {submodule} is not listed in the current task, and it \
             is on {branch} instead of {task_branch}. Add it to the task \
             file's submodules and run: git -C {submodule} checkout \
             {task_branch}",
        ))),
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
