// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution plans: ordered groups of task ids with dependencies.

use serde::{Deserialize, Serialize};

/// Lifecycle of a plan group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One group of tasks that may run concurrently.
///
/// A group is eligible to run only when every group named in `depends_on`
/// is `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGroup {
    pub id: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
    pub status: GroupStatus,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A directed sequence of task groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    #[serde(default)]
    pub groups: Vec<PlanGroup>,
}

impl ExecutionPlan {
    pub fn group(&self, id: &str) -> Option<&PlanGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut PlanGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// The group containing `task_id`, if any.
    pub fn group_of_task(&self, task_id: &str) -> Option<&PlanGroup> {
        self.groups
            .iter()
            .find(|g| g.task_ids.iter().any(|t| t == task_id))
    }

    /// True when every dependency of `group` is completed.
    pub fn deps_completed(&self, group: &PlanGroup) -> bool {
        group.depends_on.iter().all(|dep| {
            self.group(dep)
                .map(|g| g.status == GroupStatus::Completed)
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
