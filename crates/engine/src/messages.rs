// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UserPromptSubmit handling: trigger phrases drive mode and protocol
//! transitions. Matching is case-insensitive substring search.

use ccs_core::{HookOutcome, HookPayload, Mode, Protocol};

use crate::ctx::{EnforceCtx, EngineError};

/// The UserPromptSubmit entry point.
pub fn user_prompt_submit(
    ctx: &EnforceCtx,
    payload: &HookPayload,
) -> Result<HookOutcome, EngineError> {
    let prompt = payload.prompt.as_deref().unwrap_or("");
    let lower = prompt.to_lowercase();
    let phrases = &ctx.config.trigger_phrases;

    let mut new_mode = None;
    let mut new_protocol = None;
    let mut stderr = Vec::new();

    if matches_any(&lower, &phrases.discussion_mode) {
        new_mode = Some(Mode::Discussion);
    } else if matches_any(&lower, &phrases.orchestration_mode) {
        new_mode = Some(Mode::Orchestration);
    }

    if matches_any(&lower, &phrases.task_creation) {
        new_protocol = Some(Protocol::Creation);
    } else if matches_any(&lower, &phrases.task_startup) {
        new_protocol = Some(Protocol::Startup);
    } else if matches_any(&lower, &phrases.task_completion) {
        new_protocol = Some(Protocol::Completion);
    } else if matches_any(&lower, &phrases.context_compaction) {
        new_protocol = Some(Protocol::Compaction);
    }

    if new_mode.is_some() || new_protocol.is_some() {
        ctx.state.edit(|state| {
            if let Some(mode) = new_mode {
                state.mode = mode;
            }
            if let Some(protocol) = new_protocol {
                state.active_protocol = Some(protocol);
                // Protocol work happens in orchestration mode.
                if new_mode.is_none() {
                    state.mode = Mode::Orchestration;
                }
            }
        })?;
        if let Some(mode) = new_mode {
            stderr.push(format!("[ccs] mode: {mode}"));
        }
        if let Some(protocol) = new_protocol {
            stderr.push(format!("[ccs] protocol: {protocol}"));
        }
    }

    let stdout = if ctx.config.features.auto_ultrathink {
        "[[ ultrathink ]]".to_string()
    } else {
        String::new()
    };

    Ok(HookOutcome {
        stdout,
        stderr: stderr.join("\n"),
        exit_code: 0,
    })
}

fn matches_any(prompt: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|p| !p.is_empty() && prompt.contains(&p.to_lowercase()))
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
