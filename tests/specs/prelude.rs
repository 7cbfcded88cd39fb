//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for invoking the ccs binary against a throwaway
//! project directory with the daemon disabled (hooks take the legacy
//! in-process path) unless a spec opts in.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Returns the path to a workspace binary.
///
/// Checks the llvm-cov target directory first so coverage runs work,
/// then the standard target directory, then resolves relative to the
/// test binary itself (target/debug/deps/specs-<hash>).
pub fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov.exists() {
        return llvm_cov;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn ccs_binary() -> PathBuf {
    binary_path("ccs")
}

pub fn ccsd_binary() -> PathBuf {
    binary_path("ccsd")
}

/// A throwaway project directory.
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write the sessions config for this project.
    pub fn write_config(&self, body: &str) {
        let config = self.root().join("sessions/sessions-config.json");
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(config, body).unwrap();
    }

    /// Read the persisted state record (the scoped path is derived the
    /// same way the binaries derive it).
    pub fn read_state(&self) -> serde_json::Value {
        let root = std::fs::canonicalize(self.root()).unwrap();
        let digest = format!("{:x}", md5_of(root.to_string_lossy().as_bytes()));
        let state = root
            .join("sessions/state")
            .join(&digest[..12])
            .join("sessions-state.json");
        let raw = std::fs::read_to_string(state).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    /// Patch the persisted state record in place.
    pub fn seed_state(&self, f: impl FnOnce(&mut serde_json::Value)) {
        // Materialize defaults first via a cheap hook invocation.
        ccs(self).hook("session-start", r#"{"session_id":"seed"}"#).run();
        let root = std::fs::canonicalize(self.root()).unwrap();
        let digest = format!("{:x}", md5_of(root.to_string_lossy().as_bytes()));
        let state_path = root
            .join("sessions/state")
            .join(&digest[..12])
            .join("sessions-state.json");
        let mut state: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
        f(&mut state);
        std::fs::write(&state_path, serde_json::to_vec_pretty(&state).unwrap()).unwrap();
    }
}

/// Same digest the binaries use for the scoped state directory.
fn md5_of(bytes: &[u8]) -> md5::Digest {
    md5::compute(bytes)
}

/// Start building a ccs invocation for `project`.
pub fn ccs(project: &Project) -> CliBuilder {
    CliBuilder::new(project.root())
}

/// Fluent builder for ccs invocations.
pub struct CliBuilder {
    args: Vec<String>,
    stdin: Option<String>,
    envs: Vec<(String, String)>,
    removed: Vec<String>,
    cwd: PathBuf,
}

impl CliBuilder {
    fn new(root: &Path) -> Self {
        Self {
            args: Vec::new(),
            stdin: None,
            envs: vec![
                ("CLAUDE_PROJECT_DIR".into(), root.to_string_lossy().into()),
                // Isolate from any real user-level daemon state
                ("HOME".into(), root.to_string_lossy().into()),
                // Point the socket somewhere no daemon listens and make
                // auto-spawn a no-op so hooks take the legacy path fast.
                (
                    "CC_SESSIONS_SOCKET".into(),
                    root.join("no-daemon.sock").to_string_lossy().into(),
                ),
                ("CCS_DAEMON_BINARY".into(), "/bin/false".into()),
                ("CCS_TIMEOUT_CONNECT_MS".into(), "100".into()),
                ("CCS_CONNECT_POLL_MS".into(), "10".into()),
            ],
            removed: vec![
                "CI".into(),
                "GITHUB_ACTIONS".into(),
                "CONTINUOUS_INTEGRATION".into(),
            ],
            cwd: root.to_path_buf(),
        }
    }

    pub fn hook(mut self, event: &str, payload: &str) -> Self {
        self.args = vec!["hook".into(), event.into()];
        self.stdin = Some(payload.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn stdin(mut self, payload: &str) -> Self {
        self.stdin = Some(payload.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn run(self) -> SpecOutput {
        use std::io::Write;

        let mut command = Command::new(ccs_binary());
        command
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for key in &self.removed {
            command.env_remove(key);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        let mut child = command.spawn().expect("spawn ccs");
        if let Some(stdin) = self.stdin {
            // Ignore EPIPE: commands that reject their arguments exit
            // before reading stdin.
            let _ = child.stdin.as_mut().unwrap().write_all(stdin.as_bytes());
        }
        drop(child.stdin.take());
        let output = child.wait_with_output().unwrap();
        SpecOutput { output }
    }
}

/// Captured process output with assertion helpers.
pub struct SpecOutput {
    pub output: Output,
}

impl SpecOutput {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> i32 {
        self.output.status.code().unwrap_or(-1)
    }

    pub fn assert_exit(self, expected: i32) -> Self {
        assert_eq!(
            self.code(),
            expected,
            "exit code mismatch\nstdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    pub fn assert_stderr_contains(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr missing {needle:?}\nstderr: {}",
            self.stderr()
        );
        self
    }

    pub fn assert_stdout_contains(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout missing {needle:?}\nstdout: {}",
            self.stdout()
        );
        self
    }
}
