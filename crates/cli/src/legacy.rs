// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bundled legacy per-invocation implementation.
//!
//! When the daemon cannot be reached (or a hook has not been migrated
//! behind `use_hook_daemon`), the shim runs the same engine handlers
//! in-process with identical semantics.

use std::path::Path;

use ccs_core::{HookEventName, HookOutcome, HookPayload, ProjectPaths};
use ccs_engine::{EnforceCtx, EngineError};

/// Run one hook entirely in-process.
pub fn run_hook(event: HookEventName, payload: &HookPayload) -> Result<HookOutcome, EngineError> {
    let cwd = payload
        .cwd
        .as_deref()
        .map(Path::new)
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    let ctx = EnforceCtx::new(ProjectPaths::discover(&cwd))?;

    match event {
        HookEventName::PreToolUse => ccs_engine::pre_tool_use(&ctx, payload),
        HookEventName::PostToolUse => ccs_engine::post_tool_use(&ctx, payload),
        HookEventName::SubagentStop => ccs_engine::subagent_stop(&ctx, payload),
        HookEventName::SessionStart => ccs_engine::session_start(&ctx, payload),
        HookEventName::UserPromptSubmit => ccs_engine::user_prompt_submit(&ctx, payload),
        HookEventName::Statusline => ccs_engine::render_statusline(&ctx, payload),
    }
}
