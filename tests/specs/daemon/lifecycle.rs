//! ccsd lifecycle: spawn, serve, statusline through the daemon, stop.

use crate::prelude::*;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

struct DaemonUnderTest {
    child: Child,
    socket: std::path::PathBuf,
    _home: tempfile::TempDir,
}

impl DaemonUnderTest {
    fn spawn(p: &Project) -> Self {
        let home = tempfile::tempdir().unwrap();
        let socket = p.root().join("daemon.sock");
        let child = Command::new(ccsd_binary())
            .env("CC_SESSIONS_SOCKET", &socket)
            .env("HOME", home.path())
            .env_remove("CI")
            .env_remove("GITHUB_ACTIONS")
            .env_remove("CONTINUOUS_INTEGRATION")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !socket.exists() {
            assert!(Instant::now() < deadline, "daemon never bound its socket");
            std::thread::sleep(Duration::from_millis(20));
        }
        Self {
            child,
            socket,
            _home: home,
        }
    }
}

impl Drop for DaemonUnderTest {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn daemon_serves_statusline_over_socket() {
    let p = Project::new();
    let daemon = DaemonUnderTest::spawn(&p);

    let payload = format!(
        r#"{{"session_id":"s","model":"Opus","cwd":"{}"}}"#,
        p.root().display()
    );
    ccs(&p)
        .hook("statusline", &payload)
        .env("CC_SESSIONS_SOCKET", daemon.socket.to_str().unwrap())
        .run()
        .assert_exit(0)
        .assert_stdout_contains("discussion");
}

#[test]
fn daemon_socket_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let p = Project::new();
    let daemon = DaemonUnderTest::spawn(&p);
    let mode = std::fs::metadata(&daemon.socket).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn statusline_falls_back_when_daemon_unreachable() {
    // The default spec environment points at a dead socket and a daemon
    // binary that exits immediately, so the legacy in-process renderer
    // must answer.
    let p = Project::new();
    ccs(&p)
        .hook("statusline", r#"{"session_id":"s","model":"Sonnet"}"#)
        .run()
        .assert_exit(0)
        .assert_stdout_contains("discussion");
}

#[test]
fn enforce_hook_routes_through_daemon_when_enabled() {
    let p = Project::new();
    p.write_config(r#"{"features": {"use_hook_daemon": true}}"#);
    let daemon = DaemonUnderTest::spawn(&p);

    let payload = format!(
        r#"{{"session_id":"s","cwd":"{}","tool_name":"Bash",
            "tool_input":{{"command":"rm -rf x"}}}}"#,
        p.root().display()
    );
    ccs(&p)
        .hook("pre-tool-use", &payload)
        .env("CC_SESSIONS_SOCKET", daemon.socket.to_str().unwrap())
        .run()
        .assert_exit(2)
        .assert_stderr_contains("DAIC");
}
