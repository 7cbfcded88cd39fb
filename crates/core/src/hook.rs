// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook payloads and outcomes.
//!
//! The host agent invokes one executable per lifecycle event with a JSON
//! payload on stdin. An outcome carries stdout, stderr, and the exit code
//! the host interprets: 0 allow, 2 block with feedback, 1 hard error.

use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by the host agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookEventName {
    PreToolUse,
    PostToolUse,
    SubagentStop,
    SessionStart,
    UserPromptSubmit,
    Statusline,
}

impl HookEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::SubagentStop => "SubagentStop",
            HookEventName::SessionStart => "SessionStart",
            HookEventName::UserPromptSubmit => "UserPromptSubmit",
            HookEventName::Statusline => "Statusline",
        }
    }
}

/// Tools that write a declared file path directly.
pub const FILE_WRITER_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// True for tools that write a declared file path directly.
pub fn is_file_writer(tool: &str) -> bool {
    FILE_WRITER_TOOLS.contains(&tool)
}

/// A hook payload as read from stdin (subset of fields we care about).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookPayload {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_response: Option<serde_json::Value>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub exit_status: Option<String>,
    /// Statusline only: model name, either a string or `{display_name}`.
    #[serde(default)]
    pub model: Option<serde_json::Value>,
    /// UserPromptSubmit only.
    #[serde(default)]
    pub prompt: Option<String>,
}

impl HookPayload {
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or("")
    }

    /// The Bash command string, if this is a Bash tool invocation.
    pub fn command(&self) -> Option<&str> {
        self.tool_input.as_ref()?.get("command")?.as_str()
    }

    /// The declared file path of a direct file-writer tool.
    pub fn file_path(&self) -> Option<&str> {
        let input = self.tool_input.as_ref()?;
        input
            .get("file_path")
            .or_else(|| input.get("notebook_path"))?
            .as_str()
    }

    /// `tool_input.<key>` as a string, if present.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.as_ref()?.get(key)?.as_str()
    }

    /// The model display name from a statusline payload.
    pub fn model_display_name(&self) -> Option<&str> {
        match self.model.as_ref()? {
            serde_json::Value::String(s) => Some(s.as_str()),
            value => value.get("display_name")?.as_str(),
        }
    }
}

/// Exit code meaning allow.
pub const EXIT_ALLOW: i32 = 0;
/// Exit code meaning hard error (host invariants would be violated).
pub const EXIT_DENY: i32 = 1;
/// Exit code meaning block, with feedback on stderr.
pub const EXIT_BLOCK: i32 = 2;

/// The result a hook hands back to the host agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl HookOutcome {
    pub fn allow() -> Self {
        Self::default()
    }

    pub fn allow_with_stderr(message: impl Into<String>) -> Self {
        Self {
            stderr: message.into(),
            ..Default::default()
        }
    }

    /// Allow, emitting the structured PreToolUse permission decision the
    /// host contract requires on stdout.
    pub fn allow_with_decision(reason: &str) -> Self {
        let body = serde_json::json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "allow",
                "permissionDecisionReason": reason,
            }
        });
        Self {
            stdout: body.to_string(),
            stderr: String::new(),
            exit_code: EXIT_ALLOW,
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: EXIT_BLOCK,
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: EXIT_DENY,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.exit_code == EXIT_ALLOW
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
