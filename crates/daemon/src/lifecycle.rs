// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: socket setup, single-instance lock, teardown.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::info;

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another ccsd instance holds the daemon lock")]
    LockFailed,

    #[error("could not determine a home directory")]
    NoStateDir,
}

/// The socket path for the invoking user.
///
/// `CC_SESSIONS_SOCKET` overrides; default is `/tmp/cc-sessions-<user>.sock`.
pub fn socket_path() -> PathBuf {
    if let Some(path) = std::env::var_os("CC_SESSIONS_SOCKET") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string());
    PathBuf::from(format!("/tmp/cc-sessions-{user}.sock"))
}

/// Daemon configuration resolved at startup.
pub struct Config {
    pub socket_path: PathBuf,
    pub state_dir: PathBuf,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
    pub version_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = dirs::home_dir()
            .ok_or(LifecycleError::NoStateDir)?
            .join(".cc-sessions");
        Ok(Self {
            socket_path: socket_path(),
            log_path: state_dir.join("daemon.log"),
            pid_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            state_dir,
        })
    }
}

/// A bound listener plus the resources released on shutdown.
pub struct Startup {
    pub listener: UnixListener,
    /// Held for the daemon's lifetime; dropping releases the flock.
    pub pid_file: std::fs::File,
}

/// Bind the socket, claim the single-instance lock, write the pid file.
pub fn startup(config: &Config) -> Result<Startup, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Single instance per user: an exclusive flock on the pid file.
    let pid_file = std::fs::OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&config.pid_path)?;
    pid_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed)?;
    use std::io::Write;
    let mut writer = &pid_file;
    writer.set_len(0)?;
    write!(writer, "{}", std::process::id())?;

    // Shims compare this against their own version and restart us on skew.
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // A stale socket from a dead daemon blocks bind; remove it.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }

    let listener = UnixListener::bind(&config.socket_path)?;
    std::fs::set_permissions(&config.socket_path, std::fs::Permissions::from_mode(0o600))?;
    info!(socket = %config.socket_path.display(), "daemon listening");

    Ok(Startup { listener, pid_file })
}

/// Remove the socket, pid, and version files on exit.
pub fn shutdown(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.pid_path);
    let _ = std::fs::remove_file(&config.version_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
