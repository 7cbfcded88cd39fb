//! Todo-list tamper detection and the one-shot clear ticket.

use crate::prelude::*;

fn seed_todos(p: &Project) {
    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["todos"]["active"] = serde_json::json!([
            {"content": "A", "status": "pending"},
            {"content": "B", "status": "pending"},
        ]);
    });
}

#[test]
fn tampered_todo_write_is_rejected_with_diff() {
    let p = Project::new();
    seed_todos(&p);

    let out = ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"TodoWrite",
                "tool_input":{"todos":[{"content":"A"},{"content":"C"}]}}"#,
        )
        .run();
    out.assert_exit(2)
        .assert_stderr_contains("A")
        .assert_stderr_contains("B")
        .assert_stderr_contains("C");

    let state = p.read_state();
    assert_eq!(state["mode"], serde_json::json!("discussion"));
    assert_eq!(state["todos"]["active"], serde_json::json!([]));
    let snapshot = &state["todos"]["parent_snapshot"];
    assert_eq!(snapshot[0]["content"], "A");
    assert_eq!(snapshot[1]["content"], "B");
}

#[test]
fn status_only_update_passes() {
    let p = Project::new();
    seed_todos(&p);
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"TodoWrite",
                "tool_input":{"todos":[
                    {"content":"A","status":"completed"},
                    {"content":"B","status":"in_progress"}]}}"#,
        )
        .run()
        .assert_exit(0);
}

#[test]
fn completing_all_todos_returns_to_discussion() {
    let p = Project::new();
    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["todos"]["active"] = serde_json::json!([
            {"content": "A", "status": "completed"},
        ]);
    });
    ccs(&p)
        .hook(
            "post-tool-use",
            r#"{"session_id":"s1","tool_name":"TodoWrite","tool_input":{"todos":[]}}"#,
        )
        .run()
        .assert_exit(0);

    let state = p.read_state();
    assert_eq!(state["mode"], serde_json::json!("discussion"));
    assert_eq!(state["todos"]["active"], serde_json::json!([]));
}

#[test]
fn stash_restoration_mints_clear_ticket() {
    let p = Project::new();
    p.seed_state(|s| {
        s["mode"] = serde_json::json!("orchestration");
        s["todos"]["active"] = serde_json::json!([
            {"content": "child", "status": "completed"},
        ]);
        s["todos"]["stashed"] = serde_json::json!([
            {"content": "parent", "status": "pending"},
        ]);
    });
    ccs(&p)
        .hook(
            "post-tool-use",
            r#"{"session_id":"s1","tool_name":"TodoWrite","tool_input":{"todos":[]}}"#,
        )
        .run()
        .assert_exit(0)
        .assert_stderr_contains("ccs todos clear");

    let state = p.read_state();
    assert_eq!(state["todos"]["active"][0]["content"], "parent");
    assert_eq!(state["flags"]["api"]["todos_clear"], serde_json::json!(true));
}

#[test]
fn todos_clear_consumes_the_ticket() {
    let p = Project::new();
    p.seed_state(|s| {
        s["flags"]["api"]["todos_clear"] = serde_json::json!(true);
        s["todos"]["active"] = serde_json::json!([{"content": "x"}]);
    });

    ccs(&p).args(&["todos", "clear"]).run().assert_exit(0);
    let state = p.read_state();
    assert_eq!(state["todos"]["active"], serde_json::json!([]));
    assert_eq!(
        state["flags"]["api"]["todos_clear"],
        serde_json::json!(false)
    );

    // Without a ticket the command refuses
    ccs(&p).args(&["todos", "clear"]).run().assert_exit(1);
}
