//! SubagentStop: bridge invocation and execution-plan advancement.

use crate::prelude::*;

fn write_stop_transcript(p: &Project) -> String {
    let path = p.root().join("stop.jsonl");
    std::fs::write(
        &path,
        concat!(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Task","input":{"task_id":"T3","group_id":"G2","subagent_type":"shared"}}]}}"#,
            "\n",
        ),
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

fn seed_plan(p: &Project) {
    p.seed_state(|s| {
        s["metadata"]["orchestration"]["session_id"] = serde_json::json!("sess-a");
        s["metadata"]["orchestration"]["execution_plan"] = serde_json::json!({
            "groups": [
                {"id": "G1", "task_ids": ["T1"], "status": "completed", "depends_on": []},
                {"id": "G2", "task_ids": ["T3", "T4"], "status": "running", "depends_on": ["G1"]},
                {"id": "G3", "task_ids": ["T5"], "status": "pending", "depends_on": ["G2"]},
            ]
        });
    });
}

/// A fake `python3` that answers the backlog-bridge contract.
fn install_fake_bridge(p: &Project, signal: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let bin_dir = p.root().join("fakebin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    let script = bin_dir.join("python3");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho '{{\"signal\":\"{signal}\",\"status\":\"ok\"}}'\n"),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    bin_dir
}

fn stop_payload(transcript: &str) -> String {
    format!(
        r#"{{"hook_event_name":"SubagentStop","session_id":"sess-a","tool_name":"Task",
            "transcript_path":"{transcript}","exit_status":"completed"}}"#
    )
}

#[test]
fn stop_advances_plan_via_bridge_signal() {
    let p = Project::new();
    seed_plan(&p);
    let transcript = write_stop_transcript(&p);
    let fake_bin = install_fake_bridge(&p, "execute_plan:group-G3");

    ccs(&p)
        .hook("subagent-stop", &stop_payload(&transcript))
        .env(
            "PATH",
            &format!("{}:{}", fake_bin.display(), std::env::var("PATH").unwrap()),
        )
        .run()
        .assert_exit(0);

    let state = p.read_state();
    let orchestration = &state["metadata"]["orchestration"];
    assert_eq!(orchestration["last_signal"], "execute_plan:group-G3");
    assert_eq!(orchestration["last_group_id"], "G2");
    assert_eq!(orchestration["last_task_id"], "T3");
    assert_eq!(orchestration["last_exit_status"], "completed");

    let groups = orchestration["execution_plan"]["groups"].as_array().unwrap();
    assert_eq!(groups[1]["status"], "completed");
    assert_eq!(groups[2]["status"], "pending");
}

#[test]
fn failed_exit_marks_group_failed() {
    let p = Project::new();
    seed_plan(&p);
    let transcript = write_stop_transcript(&p);
    let fake_bin = install_fake_bridge(&p, "execute_plan:halt");

    let payload = format!(
        r#"{{"session_id":"sess-a","tool_name":"Task",
            "transcript_path":"{transcript}","exit_status":"Failed"}}"#
    );
    ccs(&p)
        .hook("subagent-stop", &payload)
        .env(
            "PATH",
            &format!("{}:{}", fake_bin.display(), std::env::var("PATH").unwrap()),
        )
        .run()
        .assert_exit(0);

    let state = p.read_state();
    let orchestration = &state["metadata"]["orchestration"];
    assert_eq!(orchestration["last_exit_status"], "failed");
    let groups = orchestration["execution_plan"]["groups"].as_array().unwrap();
    assert_eq!(groups[1]["status"], "failed");
}

#[test]
fn missing_bridge_leaves_plan_untouched_and_exits_zero() {
    let p = Project::new();
    seed_plan(&p);
    let transcript = write_stop_transcript(&p);

    // No fake python3 on PATH: the module import fails, the bridge call
    // errors, and the hook must still exit 0 without touching the plan.
    ccs(&p)
        .hook("subagent-stop", &stop_payload(&transcript))
        .run()
        .assert_exit(0);

    let state = p.read_state();
    let orchestration = &state["metadata"]["orchestration"];
    assert!(orchestration["last_signal"].is_null());
    let groups = orchestration["execution_plan"]["groups"].as_array().unwrap();
    assert_eq!(groups[1]["status"], "running");
}

#[test]
fn non_task_stop_is_ignored() {
    let p = Project::new();
    ccs(&p)
        .hook(
            "subagent-stop",
            r#"{"session_id":"s","tool_name":"Bash"}"#,
        )
        .run()
        .assert_exit(0);
}
