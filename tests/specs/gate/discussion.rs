//! Discussion-mode command gating (the DAIC boundary).

use crate::prelude::*;

#[test]
fn bash_read_allowed_in_discussion() {
    let p = Project::new();
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"hook_event_name":"PreToolUse","session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"ls -la"}}"#,
        )
        .run()
        .assert_exit(0)
        .assert_stdout_contains(r#""hookEventName":"PreToolUse""#)
        .assert_stdout_contains(r#""permissionDecision":"allow""#);
}

#[test]
fn bash_write_blocked_in_discussion() {
    let p = Project::new();
    let out = ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"rm -rf /tmp/test"}}"#,
        )
        .run();
    let stderr = out.stderr().to_lowercase();
    out.assert_exit(2);
    assert!(stderr.contains("daic"), "{stderr}");
    assert!(stderr.contains("blocked"), "{stderr}");
}

#[test]
fn write_tool_blocked_in_discussion() {
    let p = Project::new();
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Write",
                "tool_input":{"file_path":"src/main.rs","content":"x"}}"#,
        )
        .run()
        .assert_exit(2)
        .assert_stderr_contains("DAIC");
}

#[test]
fn orchestration_mode_permits_writes() {
    let p = Project::new();
    p.seed_state(|s| s["mode"] = serde_json::json!("orchestration"));
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"rm -rf /tmp/test"}}"#,
        )
        .run()
        .assert_exit(0);
}

#[test]
fn custom_write_pattern_from_config_blocks() {
    let p = Project::new();
    p.write_config(r#"{"write_patterns":["mytool deploy"]}"#);
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"mytool deploy --prod"}}"#,
        )
        .run()
        .assert_exit(2);
}

#[test]
fn extrasafe_blocks_unknown_commands() {
    let p = Project::new();
    p.write_config(r#"{"extrasafe": true}"#);
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"unknown-widget --flag"}}"#,
        )
        .run()
        .assert_exit(2);
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash","tool_input":{"command":"ls"}}"#,
        )
        .run()
        .assert_exit(0);
}

#[test]
fn ci_env_disables_gating() {
    let p = Project::new();
    ccs(&p)
        .hook(
            "pre-tool-use",
            r#"{"session_id":"s1","tool_name":"Bash",
                "tool_input":{"command":"rm -rf /tmp/test"}}"#,
        )
        .env("CI", "true")
        .run()
        .assert_exit(0);
}

#[test]
fn malformed_payload_is_ignored() {
    let p = Project::new();
    ccs(&p)
        .hook("pre-tool-use", "this is not json")
        .run()
        .assert_exit(0);
}
