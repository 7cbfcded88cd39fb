// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User configuration record.
//!
//! Read-mostly preferences persisted at `sessions/sessions-config.json`
//! (un-scoped, checked into the repo). Schema migrations are applied by
//! the config store on load.

use serde::{Deserialize, Serialize};

/// Trigger phrase sets, one per protocol or mode switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPhrases {
    #[serde(default)]
    pub orchestration_mode: Vec<String>,
    #[serde(default)]
    pub discussion_mode: Vec<String>,
    #[serde(default)]
    pub task_creation: Vec<String>,
    #[serde(default)]
    pub task_startup: Vec<String>,
    #[serde(default)]
    pub task_completion: Vec<String>,
    #[serde(default)]
    pub context_compaction: Vec<String>,
}

impl Default for TriggerPhrases {
    fn default() -> Self {
        Self {
            orchestration_mode: vec!["make it so".into(), "go ahead".into(), "run that".into()],
            discussion_mode: vec!["stop".into(), "hold on".into(), "discuss".into()],
            task_creation: vec!["mek:".into()],
            task_startup: vec!["start^".into()],
            task_completion: vec!["finito".into()],
            context_compaction: vec!["lets compact".into()],
        }
    }
}

/// Git workflow preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPreferences {
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// "conventional", "simple", or a free-form template name.
    #[serde(default = "default_commit_style")]
    pub commit_style: String,
    #[serde(default)]
    pub auto_merge: bool,
    #[serde(default)]
    pub auto_push: bool,
    #[serde(default)]
    pub has_submodules: bool,
}

fn default_branch() -> String {
    "main".into()
}

fn default_commit_style() -> String {
    "conventional".into()
}

impl Default for GitPreferences {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            commit_style: default_commit_style(),
            auto_merge: false,
            auto_push: false,
            has_submodules: false,
        }
    }
}

/// Developer environment facts used in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub shell: String,
    #[serde(default)]
    pub developer_name: String,
}

/// Statusline icon rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconStyle {
    NerdFonts,
    #[default]
    Emoji,
    Ascii,
}

/// Feature toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default = "enabled")]
    pub branch_enforcement: bool,
    #[serde(default = "enabled")]
    pub task_detection: bool,
    #[serde(default)]
    pub auto_ultrathink: bool,
    #[serde(default)]
    pub icon_style: IconStyle,
    #[serde(default = "enabled")]
    pub context_warnings_85: bool,
    #[serde(default = "enabled")]
    pub context_warnings_90: bool,
    /// Adapter name for the external memory service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_adapter: Option<String>,
    /// Routes migrated hooks through the daemon instead of in-process.
    #[serde(default)]
    pub use_hook_daemon: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Features {
    fn default() -> Self {
        Self {
            branch_enforcement: true,
            task_detection: true,
            auto_ultrathink: false,
            icon_style: IconStyle::default(),
            context_warnings_85: true,
            context_warnings_90: true,
            memory_adapter: None,
            use_hook_daemon: false,
        }
    }
}

/// The user configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub trigger_phrases: TriggerPhrases,
    /// Tools the host must not invoke in discussion mode.
    #[serde(default = "default_blocked_tools")]
    pub blocked_tools: Vec<String>,
    /// Custom command patterns forced read-only, matched against the
    /// command head or as a prefix of the whole command.
    #[serde(default)]
    pub read_patterns: Vec<String>,
    /// Custom command patterns forced write-like.
    #[serde(default)]
    pub write_patterns: Vec<String>,
    /// When set, any head command outside the read-only allowlist is
    /// treated as write-like.
    #[serde(default)]
    pub extrasafe: bool,
    #[serde(default)]
    pub git_preferences: GitPreferences,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub features: Features,
}

fn default_blocked_tools() -> Vec<String> {
    vec![
        "Write".into(),
        "Edit".into(),
        "MultiEdit".into(),
        "NotebookEdit".into(),
    ]
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            trigger_phrases: TriggerPhrases::default(),
            blocked_tools: default_blocked_tools(),
            read_patterns: Vec::new(),
            write_patterns: Vec::new(),
            extrasafe: false,
            git_preferences: GitPreferences::default(),
            environment: Environment::default(),
            features: Features::default(),
        }
    }
}

impl SessionsConfig {
    /// True when `tool` is blocked in discussion mode.
    pub fn is_blocked_tool(&self, tool: &str) -> bool {
        self.blocked_tools.iter().any(|t| t == tool)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
