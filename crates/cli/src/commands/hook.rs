// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hook shim: stdin → daemon (or legacy) → stdout/stderr/exit.

use std::io::{Read, Write};
use std::path::Path;

use ccs_core::{HookEventName, HookPayload, ProjectPaths};
use ccs_state::ConfigStore;

use crate::client::DaemonClient;
use crate::legacy;

/// Run a hook shim. Returns the process exit code for the host.
pub fn run(event_arg: &str) -> i32 {
    let Some((event, wire_name)) = resolve_event(event_arg) else {
        eprintln!("unknown hook event: {event_arg}");
        eprintln!(
            "expected one of: pre-tool-use, post-tool-use, subagent-stop, \
             session-start, user-prompt-submit, statusline"
        );
        return 1;
    };

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        // No usable payload; stay out of the host's way.
        return 0;
    }
    let payload = match HookPayload::parse(&input) {
        Ok(payload) => payload,
        Err(e) => {
            // Malformed payloads must not break the host session.
            eprintln!("[ccs] ignoring malformed hook payload: {e}");
            return 0;
        }
    };

    if use_daemon(event, &payload) {
        if let Some(code) = try_daemon(wire_name, &input) {
            return code;
        }
        // Terminal daemon failure: the bundled legacy implementation
        // guarantees correct behavior even where listen() is denied.
    }

    run_legacy(event, &payload)
}

/// Map CLI event names to the engine event and its daemon wire name.
fn resolve_event(event_arg: &str) -> Option<(HookEventName, &'static str)> {
    match event_arg {
        "pre-tool-use" => Some((HookEventName::PreToolUse, "sessions_enforce")),
        "post-tool-use" => Some((HookEventName::PostToolUse, "post_tool_use")),
        "subagent-stop" => Some((HookEventName::SubagentStop, "subagent_hooks")),
        "session-start" => Some((HookEventName::SessionStart, "session_start")),
        "user-prompt-submit" => Some((HookEventName::UserPromptSubmit, "user_messages")),
        "statusline" => Some((HookEventName::Statusline, "statusline")),
        _ => None,
    }
}

/// Statusline always prefers the daemon (it owns the hot caches); the
/// enforcement hooks route there only once migrated via config.
fn use_daemon(event: HookEventName, payload: &HookPayload) -> bool {
    if event == HookEventName::Statusline {
        return true;
    }
    let cwd = payload
        .cwd
        .as_deref()
        .map(Path::new)
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok());
    let Some(cwd) = cwd else {
        return false;
    };
    ConfigStore::new(&ProjectPaths::discover(&cwd))
        .load()
        .map(|config| config.features.use_hook_daemon)
        .unwrap_or(false)
}

/// Attempt the daemon path. `None` means fall back to legacy.
fn try_daemon(wire_name: &str, raw_payload: &str) -> Option<i32> {
    let payload_value: serde_json::Value = serde_json::from_str(raw_payload).ok()?;
    let client = DaemonClient::connect_or_start().ok()?;
    let response = client.request(wire_name, payload_value).ok()?;

    emit(&response.stdout, &response.stderr);
    Some(response.exit_code)
}

fn run_legacy(event: HookEventName, payload: &HookPayload) -> i32 {
    match legacy::run_hook(event, payload) {
        Ok(outcome) => {
            emit(&outcome.stdout, &outcome.stderr);
            outcome.exit_code
        }
        Err(e) => {
            eprintln!("[ccs] hook failed: {e}");
            1
        }
    }
}

fn emit(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        let mut out = std::io::stdout();
        let _ = out.write_all(stdout.as_bytes());
        if !stdout.ends_with('\n') {
            let _ = out.write_all(b"\n");
        }
    }
    if !stderr.is_empty() {
        eprintln!("{stderr}");
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
