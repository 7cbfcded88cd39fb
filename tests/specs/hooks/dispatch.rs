//! Transcript slicing on sub-agent dispatch.

use crate::prelude::*;

fn write_transcript(p: &Project, name: &str, marker: &str, lines: usize) -> String {
    use std::io::Write;
    let path = p.root().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"{{"type":"assistant","message":{{"content":[{{"type":"tool_use","name":"Edit","input":{{"file_path":"a.rs"}}}}]}}}}"#
    )
    .unwrap();
    for i in 0..lines {
        writeln!(
            file,
            r#"{{"type":"user","message":{{"content":[{{"type":"text","text":"{marker} {i} {pad}"}}]}}}}"#,
            pad = "x".repeat(300),
        )
        .unwrap();
    }
    path.to_string_lossy().into_owned()
}

fn dispatch_payload(session: &str, transcript: &str) -> String {
    format!(
        r#"{{"session_id":"{session}","tool_name":"Task","transcript_path":"{transcript}",
            "tool_input":{{"subagent_type":"shared"}}}}"#
    )
}

fn chunk_dir(p: &Project) -> std::path::PathBuf {
    p.root().join("sessions/transcripts/shared")
}

#[test]
fn dispatch_writes_bounded_chunks() {
    let p = Project::new();
    let transcript = write_transcript(&p, "t.jsonl", "alpha", 300);
    ccs(&p)
        .hook("pre-tool-use", &dispatch_payload("sess-1", &transcript))
        .run()
        .assert_exit(0);

    let entries: Vec<_> = std::fs::read_dir(chunk_dir(&p))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(!entries.is_empty());
    for entry in entries {
        let name = entry.file_name().into_string().unwrap();
        assert!(name.starts_with("current_transcript_"), "{name}");
        assert!(name.ends_with(".txt"), "{name}");
        assert!(entry.metadata().unwrap().len() <= 24_000);
    }

    let state = p.read_state();
    assert_eq!(state["flags"]["subagent"], serde_json::json!(true));
    assert_eq!(
        state["flags"]["subagent_session_id"],
        serde_json::json!("sess-1")
    );
}

#[test]
fn concurrent_dispatches_serialize_on_target_lock() {
    let p = Project::new();
    let transcript_a = write_transcript(&p, "a.jsonl", "alpha", 250);
    let transcript_b = write_transcript(&p, "b.jsonl", "bravo", 250);

    // Distinct sessions: each dispatch clears the other's flag as stale
    // and proceeds.
    let payload_a = dispatch_payload("sess-A", &transcript_a);
    let payload_b = dispatch_payload("sess-B", &transcript_b);

    let root = p.root().to_path_buf();
    let run = |payload: String| {
        let root = root.clone();
        std::thread::spawn(move || {
            use std::io::Write;
            use std::process::{Command, Stdio};
            let mut child = Command::new(ccs_binary())
                .args(["hook", "pre-tool-use"])
                .current_dir(&root)
                .env("CLAUDE_PROJECT_DIR", &root)
                .env("CC_SESSIONS_SOCKET", root.join("no.sock"))
                .env("CCS_DAEMON_BINARY", "/bin/false")
                .env("CCS_TIMEOUT_CONNECT_MS", "100")
                .env_remove("CI")
                .env_remove("GITHUB_ACTIONS")
                .env_remove("CONTINUOUS_INTEGRATION")
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn()
                .unwrap();
            child
                .stdin
                .as_mut()
                .unwrap()
                .write_all(payload.as_bytes())
                .unwrap();
            drop(child.stdin.take());
            child.wait_with_output().unwrap()
        })
    };

    let handle_a = run(payload_a);
    let handle_b = run(payload_b);
    let out_a = handle_a.join().unwrap();
    let out_b = handle_b.join().unwrap();
    assert!(out_a.status.success(), "{}", String::from_utf8_lossy(&out_a.stderr));
    assert!(out_b.status.success(), "{}", String::from_utf8_lossy(&out_b.stderr));

    // The surviving chunk set belongs to exactly one dispatch (the later
    // writer emptied the directory first), and every chunk is bounded.
    let mut body = String::new();
    for entry in std::fs::read_dir(chunk_dir(&p)).unwrap() {
        let entry = entry.unwrap();
        assert!(entry.metadata().unwrap().len() <= 24_000);
        body.push_str(&std::fs::read_to_string(entry.path()).unwrap());
    }
    let has_alpha = body.contains("alpha");
    let has_bravo = body.contains("bravo");
    assert!(
        has_alpha != has_bravo,
        "chunk set mixes dispatches (alpha: {has_alpha}, bravo: {has_bravo})"
    );
}

#[test]
fn subtask_end_releases_chunks_and_flag() {
    let p = Project::new();
    let transcript = write_transcript(&p, "t.jsonl", "alpha", 10);
    ccs(&p)
        .hook("pre-tool-use", &dispatch_payload("sess-1", &transcript))
        .run()
        .assert_exit(0);
    assert!(chunk_dir(&p).exists());

    ccs(&p)
        .hook(
            "post-tool-use",
            r#"{"session_id":"sess-1","tool_name":"Task",
                "tool_input":{"subagent_type":"shared"}}"#,
        )
        .run()
        .assert_exit(0);

    let state = p.read_state();
    assert_eq!(state["flags"]["subagent"], serde_json::json!(false));
    assert!(!chunk_dir(&p).exists());
}
