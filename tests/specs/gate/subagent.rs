//! Sub-agent containment: nested dispatch, protected state, staleness.

use crate::prelude::*;

#[test]
fn nested_task_dispatch_blocked() {
    let p = Project::new();
    p.seed_state(|s| {
        s["flags"]["subagent"] = serde_json::json!(true);
        s["flags"]["subagent_session_id"] = serde_json::json!("sess-A");
    });
    let out = ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"sess-A","tool_name":"Task",
                "tool_input":{"subagent_type":"shared"}}"#,
        )
        .run();
    let stderr = out.stderr().to_lowercase();
    out.assert_exit(2);
    assert!(stderr.contains("cannot spawn nested subagents"), "{stderr}");
}

#[test]
fn stale_subagent_flag_auto_cleared() {
    let p = Project::new();
    p.seed_state(|s| {
        s["flags"]["subagent"] = serde_json::json!(true);
        s["flags"]["subagent_session_id"] = serde_json::json!("old-A");
    });
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"new-B","tool_name":"Task",
                "tool_input":{"subagent_type":"shared"}}"#,
        )
        .run()
        .assert_exit(0);

    let state = p.read_state();
    assert_eq!(state["flags"]["subagent"], serde_json::json!(false));
}

#[test]
fn subagent_cannot_overwrite_plan_via_symlink() {
    let p = Project::new();
    let plan = p.root().join("sessions/state/execution_plan.json");
    std::fs::create_dir_all(plan.parent().unwrap()).unwrap();
    std::fs::write(&plan, "{}").unwrap();
    std::os::unix::fs::symlink(&plan, p.root().join("L")).unwrap();

    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["flags"]["subagent"] = serde_json::json!(true);
        s["flags"]["subagent_session_id"] = serde_json::json!("sess-A");
    });

    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"sess-A","tool_name":"Write",
                "tool_input":{"file_path":"L","content":"{}"}}"#,
        )
        .run()
        .assert_exit(2)
        .assert_stderr_contains("cannot modify orchestration state");
}

#[test]
fn subagent_bash_redirect_to_state_blocked() {
    let p = Project::new();
    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["flags"]["subagent"] = serde_json::json!(true);
        s["flags"]["subagent_session_id"] = serde_json::json!("sess-A");
    });
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"sess-A","tool_name":"Bash",
                "tool_input":{"command":"echo x > sessions/state/session_index.json"}}"#,
        )
        .run()
        .assert_exit(2)
        .assert_stderr_contains("cannot modify orchestration state");
}

#[test]
fn subagent_ordinary_writes_pass() {
    let p = Project::new();
    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["flags"]["subagent"] = serde_json::json!(true);
        s["flags"]["subagent_session_id"] = serde_json::json!("sess-A");
    });
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"sess-A","tool_name":"Write",
                "tool_input":{"file_path":"src/lib.rs","content":"fn x() {}"}}"#,
        )
        .run()
        .assert_exit(0);
}
