// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{payload, project};
use ccs_core::{Todo, TodoStatus};
use serde_json::json;

fn completed(content: &str) -> Todo {
    Todo {
        content: content.into(),
        status: TodoStatus::Completed,
        active_form: None,
    }
}

#[test]
fn cd_emits_cwd_breadcrumb() {
    let p = project();
    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "cwd": "/work/project/sub",
            "tool_name": "Bash",
            "tool_input": {"command": "cd sub && ls"},
        })),
    )
    .unwrap();
    assert!(outcome.is_allow());
    assert!(outcome.stderr.contains("/work/project/sub"));
}

#[test]
fn plain_bash_emits_nothing() {
    let p = project();
    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "cwd": "/work",
            "tool_name": "Bash",
            "tool_input": {"command": "ls -la"},
        })),
    )
    .unwrap();
    assert!(outcome.stderr.is_empty());
}

#[test]
fn task_finish_releases_ownership_and_flag() {
    let p = project();
    p.set_state(|s| {
        s.flags.subagent = true;
        s.flags.subagent_session_id = Some("s".into());
        s.execution_windows.tasks.push(ccs_core::TaskWindow {
            file: "sessions/tasks/t.md".into(),
            assigned_to: Some("T1".into()),
            assigned_files: vec!["a.rs".into()],
            ..Default::default()
        });
    });
    let chunk_dir = p.ctx.paths.transcript_target_dir("shared");
    std::fs::create_dir_all(&chunk_dir).unwrap();
    std::fs::write(chunk_dir.join("current_transcript_000.txt"), "x").unwrap();

    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Task",
            "tool_input": {"subagent_type": "shared", "task_id": "T1"},
        })),
    )
    .unwrap();
    assert!(outcome.is_allow());

    let state = p.state();
    assert!(!state.flags.subagent);
    assert!(state.execution_windows.tasks[0].assigned_to.is_none());
    assert!(!chunk_dir.exists());
}

#[test]
fn completion_protocol_finishes_task() {
    let p = project();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.active_protocol = Some(ccs_core::Protocol::Completion);
        s.current_task.name = Some("t".into());
        s.current_task.file = Some("sessions/tasks/t.md".into());
        s.todos.active = vec![completed("wrap up")];
    });

    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({"session_id": "s", "tool_name": "TodoWrite", "tool_input": {"todos": []}})),
    )
    .unwrap();

    let state = p.state();
    assert_eq!(state.mode, ccs_core::Mode::Discussion);
    assert!(state.active_protocol.is_none());
    assert!(!state.current_task.is_set());
    assert!(state.todos.active.is_empty());
    assert!(outcome.stderr.contains("Task complete"));
}

#[test]
fn stash_restores_and_mints_ticket() {
    let p = project();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.todos.active = vec![completed("child work")];
        s.todos.stashed = vec![Todo::new("parent work")];
    });

    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({"session_id": "s", "tool_name": "TodoWrite", "tool_input": {"todos": []}})),
    )
    .unwrap();

    let state = p.state();
    assert_eq!(state.todos.active.len(), 1);
    assert_eq!(state.todos.active[0].content, "parent work");
    assert!(state.todos.stashed.is_empty());
    assert!(state.flags.api.todos_clear);
    assert!(outcome.stderr.contains("ccs todos clear"));
}

#[test]
fn all_complete_without_stash_returns_to_discussion() {
    let p = project();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.todos.active = vec![completed("only item")];
    });

    post_tool_use(
        &p.ctx,
        &payload(json!({"session_id": "s", "tool_name": "TodoWrite", "tool_input": {"todos": []}})),
    )
    .unwrap();

    let state = p.state();
    assert_eq!(state.mode, ccs_core::Mode::Discussion);
    assert!(state.todos.active.is_empty());
}

#[test]
fn incomplete_todos_change_nothing() {
    let p = project();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.todos.active = vec![completed("done"), Todo::new("not yet")];
    });
    post_tool_use(
        &p.ctx,
        &payload(json!({"session_id": "s", "tool_name": "TodoWrite", "tool_input": {"todos": []}})),
    )
    .unwrap();
    assert_eq!(p.state().mode, ccs_core::Mode::Orchestration);
    assert_eq!(p.state().todos.active.len(), 2);
}

#[test]
fn any_other_tool_revokes_ticket() {
    let p = project();
    p.set_state(|s| s.flags.api.todos_clear = true);
    post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"},
        })),
    )
    .unwrap();
    assert!(!p.state().flags.api.todos_clear);
}

#[test]
fn todos_clear_invocation_keeps_ticket() {
    let p = project();
    p.set_state(|s| s.flags.api.todos_clear = true);
    post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Bash",
            "tool_input": {"command": "ccs todos clear"},
        })),
    )
    .unwrap();
    assert!(p.state().flags.api.todos_clear);
}

#[test]
fn task_file_edit_reparses_frontmatter() {
    let p = project();
    let task_rel = "sessions/tasks/refactor.md";
    let task_abs = p.root().join(task_rel);
    std::fs::create_dir_all(task_abs.parent().unwrap()).unwrap();
    std::fs::write(
        &task_abs,
        "---\ntask: refactor\nbranch: feature/refactor\nstatus: in-progress\nsubmodules: [api]\n---\n",
    )
    .unwrap();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.current_task.name = Some("refactor".into());
        s.current_task.file = Some(task_rel.into());
    });

    post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Edit",
            "tool_input": {"file_path": task_rel},
        })),
    )
    .unwrap();

    let state = p.state();
    assert_eq!(state.current_task.branch.as_deref(), Some("feature/refactor"));
    assert_eq!(state.current_task.status.as_deref(), Some("in-progress"));
    assert!(state.current_task.submodules.contains("api"));
}

#[test]
fn other_file_edit_does_not_touch_task() {
    let p = project();
    p.set_state(|s| {
        s.current_task.name = Some("t".into());
        s.current_task.file = Some("sessions/tasks/t.md".into());
    });
    post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Edit",
            "tool_input": {"file_path": "src/lib.rs"},
        })),
    )
    .unwrap();
    assert!(p.state().current_task.branch.is_none());
}

#[test]
fn idle_orchestration_task_emits_reminder() {
    let p = project();
    p.set_state(|s| {
        s.mode = ccs_core::Mode::Orchestration;
        s.current_task.name = Some("lonely-task".into());
    });
    let outcome = post_tool_use(
        &p.ctx,
        &payload(json!({
            "session_id": "s",
            "tool_name": "Read",
            "tool_input": {"file_path": "x"},
        })),
    )
    .unwrap();
    assert!(outcome.stderr.contains("lonely-task"));
    assert!(outcome.stderr.contains("Reminder"));
}
