// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Todo lists proposed by the host agent and tracked across mode changes.

use serde::{Deserialize, Serialize};

/// Completion state of a single todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// A single todo item as proposed by the host's TodoWrite tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub content: String,
    #[serde(default)]
    pub status: TodoStatus,
    /// Present-continuous label the host shows while the item is in progress.
    #[serde(default, rename = "activeForm", skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
}

impl Todo {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            status: TodoStatus::Pending,
            active_form: None,
        }
    }
}

/// The three todo sequences tracked in state.
///
/// `active` is what the host currently sees. `stashed` holds a list set
/// aside by a protocol. `parent_snapshot` preserves the active list at the
/// moment a tampering TodoWrite was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todos {
    #[serde(default)]
    pub active: Vec<Todo>,
    #[serde(default)]
    pub stashed: Vec<Todo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_snapshot: Option<Vec<Todo>>,
}

impl Todos {
    /// The `content` fields of the active list, in order.
    pub fn active_contents(&self) -> Vec<&str> {
        self.active.iter().map(|t| t.content.as_str()).collect()
    }

    /// True when the active list is non-empty and every item is completed.
    pub fn all_completed(&self) -> bool {
        !self.active.is_empty()
            && self
                .active
                .iter()
                .all(|t| t.status == TodoStatus::Completed)
    }

    /// True when an incoming proposal preserves the active content sequence.
    ///
    /// Status changes are always legitimate; content edits, insertions,
    /// removals, and reorderings are tampering.
    pub fn contents_match(&self, proposed: &[Todo]) -> bool {
        self.active.len() == proposed.len()
            && self
                .active
                .iter()
                .zip(proposed.iter())
                .all(|(a, b)| a.content == b.content)
    }
}

#[cfg(test)]
#[path = "todo_tests.rs"]
mod tests;
