// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent sessions state record.
//!
//! One record exists per project, scoped by the project id hash. Every
//! field tolerates absence on load so records written by older versions
//! deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::mode::{Mode, ModelTier, Protocol};
use crate::plan::ExecutionPlan;
use crate::task::TaskState;
use crate::todo::Todos;

/// One-shot capability tickets minted by the bookkeeper.
///
/// A ticket grants exactly one subsequent CLI invocation and is revoked by
/// any other tool use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTickets {
    #[serde(default)]
    pub todos_clear: bool,
}

/// Session flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default)]
    pub context_85: bool,
    #[serde(default)]
    pub context_90: bool,
    /// True while a sub-agent dispatched by this session is running.
    #[serde(default)]
    pub subagent: bool,
    /// Host session id that owns the subagent flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subagent_session_id: Option<String>,
    #[serde(default)]
    pub noob: bool,
    /// Disables discussion-mode gating (CI or explicit user override).
    #[serde(default)]
    pub bypass_mode: bool,
    #[serde(default)]
    pub api: ApiTickets,
}

impl Flags {
    /// True when the subagent flag belongs to a session other than
    /// `session_id` — the owner crashed and the flag must be cleared.
    pub fn is_subagent_stale(&self, session_id: &str) -> bool {
        self.subagent
            && self
                .subagent_session_id
                .as_deref()
                .map(|owner| owner != session_id)
                .unwrap_or(true)
    }

    pub fn clear_subagent(&mut self) {
        self.subagent = false;
        self.subagent_session_id = None;
    }
}

/// Orchestration bookkeeping written by the sub-agent stop pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<ExecutionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signal_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exit_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payload: Option<serde_json::Value>,
}

/// Container for orchestration metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub orchestration: OrchestrationMeta,
}

/// Ownership status of a task window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

/// Per-task ownership record inside an execution window.
///
/// At most one window may list a given file in `assigned_files` at any
/// instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    /// Task file path relative to the project root.
    pub file: String,
    #[serde(default)]
    pub status: WindowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Hex SHA-256 of the task file content at assignment time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
    /// Sub-agent id currently holding the window, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub conflict_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_with: Option<String>,
    #[serde(default)]
    pub conflict_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_at: Option<String>,
}

/// File-ownership windows for concurrently running sub-agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionWindows {
    #[serde(default)]
    pub tasks: Vec<TaskWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_window_id: Option<String>,
}

impl ExecutionWindows {
    /// The window (if any) whose `assigned_files` intersect `files`,
    /// excluding windows assigned to `except`.
    pub fn conflicting_window(&self, files: &[String], except: Option<&str>) -> Option<&TaskWindow> {
        self.tasks.iter().find(|w| {
            w.assigned_to.is_some()
                && w.assigned_to.as_deref() != except
                && w.assigned_files.iter().any(|f| files.contains(f))
        })
    }

    /// Release every window held by `agent_id`, returning how many were freed.
    pub fn release_owned_by(&mut self, agent_id: &str) -> usize {
        let mut released = 0;
        for window in &mut self.tasks {
            if window.assigned_to.as_deref() == Some(agent_id) {
                window.assigned_to = None;
                window.assigned_files.clear();
                window.assigned_at = None;
                released += 1;
            }
        }
        released
    }
}

/// The authoritative persistent state for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionsState {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub current_task: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_protocol: Option<Protocol>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub todos: Todos,
    #[serde(default)]
    pub model: ModelTier,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub execution_windows: ExecutionWindows,
}

impl SessionsState {
    /// A default-initialized record stamped with the current version.
    pub fn new_default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
