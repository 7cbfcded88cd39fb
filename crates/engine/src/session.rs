// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SessionStart handling: crash cleanup and a short recap for the host.

use ccs_core::{HookOutcome, HookPayload};

use crate::ctx::{EnforceCtx, EngineError};

/// The SessionStart entry point.
///
/// A sub-agent flag left behind by a crashed owner is cleared here so a
/// fresh session never starts gated as a sub-agent.
pub fn session_start(ctx: &EnforceCtx, payload: &HookPayload) -> Result<HookOutcome, EngineError> {
    let state = ctx.state.load()?;

    if state.flags.is_subagent_stale(payload.session_id()) {
        ctx.state.edit(|s| s.flags.clear_subagent())?;
    }

    let state = ctx.state.load()?;
    let mut recap = format!("[ccs] mode: {}", state.mode);
    if let Some(name) = state.current_task.name.as_deref() {
        recap.push_str(&format!(" | task: {name}"));
        if let Some(branch) = state.current_task.branch.as_deref() {
            recap.push_str(&format!(" ({branch})"));
        }
    }
    Ok(HookOutcome::allow_with_stderr(recap))
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
