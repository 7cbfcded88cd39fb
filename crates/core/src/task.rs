// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task files and their YAML-style frontmatter.
//!
//! A task is a markdown file under `sessions/tasks/` with a frontmatter
//! block between two `---` fence lines. Values are plain `key: value`
//! pairs; `submodules`/`modules` and `dependencies` accept comma-separated
//! lists inside `[...]`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The current task as recorded in state. All fields nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Task file path relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Submodule directory names this task is allowed to touch.
    #[serde(default)]
    pub submodules: BTreeSet<String>,
}

impl TaskState {
    pub fn is_set(&self) -> bool {
        self.name.is_some() || self.file.is_some()
    }

    pub fn clear(&mut self) {
        *self = TaskState::default();
    }

    /// Merge parsed frontmatter into this record, keeping fields the
    /// frontmatter does not mention.
    pub fn apply_frontmatter(&mut self, fm: &TaskFrontmatter) {
        if fm.name.is_some() {
            self.name.clone_from(&fm.name);
        }
        if fm.file.is_some() {
            self.file.clone_from(&fm.file);
        }
        if fm.branch.is_some() {
            self.branch.clone_from(&fm.branch);
        }
        if fm.status.is_some() {
            self.status.clone_from(&fm.status);
        }
        if fm.created.is_some() {
            self.created.clone_from(&fm.created);
        }
        if fm.started.is_some() {
            self.started.clone_from(&fm.started);
        }
        if fm.updated.is_some() {
            self.updated.clone_from(&fm.updated);
        }
        if let Some(deps) = &fm.dependencies {
            self.dependencies.clone_from(deps);
        }
        if let Some(subs) = &fm.submodules {
            self.submodules = subs.iter().cloned().collect();
        }
    }
}

/// Frontmatter fields recognized in a task file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFrontmatter {
    pub name: Option<String>,
    pub file: Option<String>,
    pub branch: Option<String>,
    pub status: Option<String>,
    pub created: Option<String>,
    pub started: Option<String>,
    pub updated: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub submodules: Option<Vec<String>>,
}

/// Parse the frontmatter block of a task file.
///
/// Returns `None` when the file does not start with a `---` fence or the
/// closing fence is missing. Unknown keys are ignored.
pub fn parse_frontmatter(text: &str) -> Option<TaskFrontmatter> {
    let mut lines = text.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }

    let mut fm = TaskFrontmatter::default();
    let mut closed = false;
    for line in lines {
        let trimmed = line.trim();
        if trimmed == "---" {
            closed = true;
            break;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "task" | "name" => fm.name = non_empty(value),
            "file" => fm.file = non_empty(value),
            "branch" => fm.branch = non_empty(value),
            "status" => fm.status = non_empty(value),
            "created" => fm.created = non_empty(value),
            "started" => fm.started = non_empty(value),
            "updated" => fm.updated = non_empty(value),
            "dependencies" => fm.dependencies = Some(parse_list(value)),
            "submodules" | "modules" => fm.submodules = Some(parse_list(value)),
            _ => {}
        }
    }

    closed.then_some(fm)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim_matches(|c| c == '"' || c == '\'').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse `[a, b, c]` (or a bare comma-separated string) into items.
fn parse_list(value: &str) -> Vec<String> {
    let inner = value
        .trim()
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
