// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compiled command taxonomy.
//!
//! Static tables, not control flow: the curated write set, the extrasafe
//! read-only allowlist, and the per-command read sub-verb allowlists.

/// Commands that mutate state regardless of arguments.
///
/// Mutation tools, package/system managers, privilege elevators, build
/// drivers, process killers, and anything whose normal purpose is to
/// change the filesystem or system state.
pub const WRITE_COMMANDS: &[&str] = &[
    // file mutation
    "rm", "rmdir", "unlink", "shred", "mv", "cp", "dd", "install", "mkdir", "touch", "truncate",
    "ln", "link", "symlink", "mkfifo", "mknod", "tee", "rsync", "scp", "sftp",
    // permissions and ownership
    "chmod", "chown", "chgrp", "chattr", "setfacl", "umask",
    // archive extraction/creation
    "tar", "unzip", "zip", "gunzip", "gzip", "bunzip2", "bzip2", "unxz", "xz", "zstd", "unzstd",
    // process control
    "kill", "pkill", "killall",
    // privilege elevators
    "sudo", "doas", "su",
    // package and system managers
    "apt", "apt-get", "dpkg", "yum", "dnf", "pacman", "apk", "brew", "port", "snap", "gem",
    "cargo", "rustup", "go", "conda", "uv", "pipx", "poetry", "pnpm", "bun", "deno", "composer",
    "nix-env",
    // build drivers
    "make", "cmake", "ninja", "meson", "bazel", "mvn", "gradle", "ant", "rake",
    // vcs mutation is arbitrated elsewhere; init-style tools are writes
    "patch",
    // system administration
    "systemctl", "service", "mount", "umount", "swapon", "swapoff", "mkfs", "mkswap", "fdisk",
    "parted", "losetup", "modprobe", "insmod", "rmmod", "sysctl", "ldconfig", "update-alternatives",
    "useradd", "userdel", "usermod", "groupadd", "groupdel", "passwd", "chpasswd", "visudo",
    "crontab", "at", "reboot", "shutdown", "halt", "poweroff",
    // network state
    "iptables", "nft", "ip", "ifconfig", "route", "tc",
];

/// Read-only allowlist consulted when `extrasafe` is on.
///
/// Under extrasafe, any head command outside this list is treated as
/// write-like even if it is not in [`WRITE_COMMANDS`].
pub const READ_ONLY_COMMANDS: &[&str] = &[
    // listing and inspection
    "ls", "dir", "vdir", "tree", "pwd", "file", "stat", "du", "df", "lsblk", "lsusb", "lspci",
    "lsof", "findmnt",
    // reading files
    "cat", "bat", "tac", "head", "tail", "less", "more", "strings", "xxd", "hexdump", "od",
    "zcat", "zless", "base64",
    // searching
    "grep", "egrep", "fgrep", "rg", "ag", "ack", "find", "fd", "locate", "which", "whereis",
    "type", "command",
    // text processing (pure filters)
    "awk", "gawk", "mawk", "sed", "gsed", "cut", "sort", "uniq", "tr", "wc", "fold", "fmt",
    "column", "paste", "join", "comm", "diff", "cmp", "expand", "unexpand", "nl", "rev", "shuf",
    "jq", "yq", "xargs",
    // checksums
    "md5sum", "sha1sum", "sha256sum", "sha512sum", "cksum", "sum", "b2sum",
    // environment and system facts
    "echo", "printf", "env", "printenv", "date", "cal", "uptime", "whoami", "who", "id",
    "groups", "hostname", "uname", "arch", "nproc", "free", "vmstat", "iostat", "dmesg",
    "locale", "tty", "true", "false", "test", "expr", "seq", "basename", "dirname", "realpath",
    "readlink", "getent", "getconf", "ulimit",
    // processes (observation)
    "ps", "top", "htop", "pgrep", "pstree", "time", "watch", "sleep",
    // network (observation)
    "ping", "traceroute", "dig", "nslookup", "host", "netstat", "ss", "curl",
    // vcs and dev tools (read sub-verbs are arbitrated separately)
    "git", "man", "info", "apropos", "whatis", "pip", "pip3", "npm", "yarn", "python", "python3",
    "node", "ruby", "perl",
];

/// Wrappers skipped before resolving the head command.
pub const WRAPPER_COMMANDS: &[&str] = &["command", "nohup", "time", "nice", "env"];

/// `git` sub-verbs that only observe the repository.
pub const GIT_READ_SUBVERBS: &[&str] = &[
    "status", "log", "diff", "show", "blame", "branch", "tag", "remote", "describe", "rev-parse",
    "rev-list", "ls-files", "ls-tree", "ls-remote", "shortlog", "reflog", "grep", "cat-file",
    "show-ref", "name-rev", "var", "version", "help",
];

/// `pip`/`pip3` sub-verbs that only read.
pub const PIP_READ_SUBVERBS: &[&str] = &["show", "list", "search", "check", "freeze", "help"];

/// `npm`/`yarn` sub-verbs that only read.
pub const NPM_READ_SUBVERBS: &[&str] = &["list", "ls", "view", "show", "search", "help"];

/// `python`/`python3` argument forms that are allowed in discussion mode.
pub const PYTHON_READ_FLAGS: &[&str] = &["-c", "-m", "--version", "-V"];

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
