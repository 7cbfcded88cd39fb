//! CLI surface basics.

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    let p = Project::new();
    ccs(&p)
        .args(&["--help"])
        .run()
        .assert_exit(0)
        .assert_stdout_contains("hook")
        .assert_stdout_contains("daemon")
        .assert_stdout_contains("todos");
}

#[test]
fn version_prints() {
    let p = Project::new();
    ccs(&p).args(&["--version"]).run().assert_exit(0);
}

#[test]
fn unknown_hook_event_errors() {
    let p = Project::new();
    ccs(&p)
        .hook("coffee-break", "{}")
        .run()
        .assert_exit(1)
        .assert_stderr_contains("unknown hook event");
}

#[test]
fn ccsd_version_prints() {
    let output = std::process::Command::new(ccsd_binary())
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ccsd"));
}

#[test]
fn session_start_emits_recap() {
    let p = Project::new();
    ccs(&p)
        .hook("session-start", r#"{"session_id":"s"}"#)
        .run()
        .assert_exit(0)
        .assert_stderr_contains("mode: discussion");
}

#[test]
fn user_prompt_trigger_switches_mode() {
    let p = Project::new();
    p.write_config(r#"{"trigger_phrases": {"orchestration_mode": ["make it so"]}}"#);
    ccs(&p)
        .hook(
            "user-prompt-submit",
            r#"{"session_id":"s","prompt":"ok make it so"}"#,
        )
        .run()
        .assert_exit(0);
    let state = p.read_state();
    assert_eq!(state["mode"], serde_json::json!("orchestration"));
}
