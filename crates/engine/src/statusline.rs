// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Statusline rendering: one line summarizing mode, task, model, and
//! todo progress. Cosmetic only; consumes the same state as everything
//! else.

use ccs_core::{HookOutcome, HookPayload, IconStyle, Mode, ModelTier, TodoStatus};

use crate::ctx::{EnforceCtx, EngineError};

/// The Statusline entry point.
pub fn render_statusline(
    ctx: &EnforceCtx,
    payload: &HookPayload,
) -> Result<HookOutcome, EngineError> {
    let state = ctx.state.load()?;
    let style = ctx.config.features.icon_style;

    let model = payload
        .model_display_name()
        .map(ModelTier::from_display_name)
        .unwrap_or(state.model);

    let mut parts = Vec::new();
    parts.push(format!("{}{}", mode_icon(style, state.mode), state.mode));

    if let Some(name) = state.current_task.name.as_deref() {
        parts.push(name.to_string());
    }

    parts.push(model_label(model).to_string());

    if !state.todos.active.is_empty() {
        let done = state
            .todos
            .active
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count();
        parts.push(format!("todos {done}/{}", state.todos.active.len()));
    }

    Ok(HookOutcome {
        stdout: parts.join(" | "),
        stderr: String::new(),
        exit_code: 0,
    })
}

fn mode_icon(style: IconStyle, mode: Mode) -> &'static str {
    match (style, mode) {
        (IconStyle::Ascii, _) => "",
        (IconStyle::Emoji, Mode::Discussion) => "💬 ",
        (IconStyle::Emoji, Mode::Orchestration) => "⚡ ",
        (IconStyle::NerdFonts, Mode::Discussion) => "\u{f075} ",
        (IconStyle::NerdFonts, Mode::Orchestration) => "\u{f0e7} ",
    }
}

fn model_label(model: ModelTier) -> &'static str {
    match model {
        ModelTier::Sonnet => "sonnet",
        ModelTier::Opus => "opus",
        ModelTier::Unknown => "model?",
    }
}

#[cfg(test)]
#[path = "statusline_tests.rs"]
mod tests;
