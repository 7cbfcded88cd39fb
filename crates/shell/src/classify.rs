// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The read-vs-write decision over a tokenized command.
//!
//! Each pipeline segment is judged independently; the command is
//! read-only iff every segment is. Process substitutions are recursed
//! into and judged under the same rules.

use crate::lexer::{split_segments, tokenize, Token, Word};
use crate::tables::{
    GIT_READ_SUBVERBS, NPM_READ_SUBVERBS, PIP_READ_SUBVERBS, PYTHON_READ_FLAGS,
    READ_ONLY_COMMANDS, WRAPPER_COMMANDS, WRITE_COMMANDS,
};

/// Knobs from user configuration.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Treat any head outside the read-only allowlist as write-like.
    pub extrasafe: bool,
    /// User patterns forced read-only (head match or command prefix).
    pub read_patterns: Vec<String>,
    /// User patterns forced write-like.
    pub write_patterns: Vec<String>,
}

/// Classify a whole command line. True iff every segment is read-only.
pub fn is_read_only(command: &str, opts: &ClassifyOptions) -> bool {
    let tokens = tokenize(command);
    split_segments(&tokens)
        .iter()
        .all(|segment| segment_read_only(segment, opts))
}

/// Classify one pipeline segment.
pub fn segment_read_only(segment: &[Token], opts: &ClassifyOptions) -> bool {
    let text = segment_text(segment);

    // User patterns take precedence, write before read.
    if matches_pattern(&text, &opts.write_patterns) {
        return false;
    }
    if matches_pattern(&text, &opts.read_patterns) {
        return true;
    }

    // Any redirection makes the segment write-like.
    if segment.iter().any(|t| matches!(t, Token::Redirect(_))) {
        return false;
    }

    // Process substitutions are judged by their inner command.
    for token in segment {
        if let Token::ProcSub(sub) = token {
            if !is_read_only(&sub.body, opts) {
                return false;
            }
        }
    }

    let args = positional_words(segment);
    let Some((head, rest)) = args.split_first() else {
        // Bare assignments or an empty segment mutate nothing.
        return true;
    };
    let head = basename(head);

    match head {
        "sed" | "gsed" => !has_in_place_flag(rest),
        "awk" | "gawk" | "mawk" => !awk_writes_file(rest),
        "find" => !find_writes(rest),
        "xargs" => xargs_read_only(rest, opts),
        "git" => git_read_only(rest),
        "pip" | "pip3" => subverb_allowed(rest, PIP_READ_SUBVERBS),
        "npm" | "yarn" => subverb_allowed(rest, NPM_READ_SUBVERBS),
        "python" | "python3" => python_read_only(rest),
        _ if WRITE_COMMANDS.contains(&head) => false,
        _ if opts.extrasafe => READ_ONLY_COMMANDS.contains(&head),
        _ => true,
    }
}

/// `git` is judged by its sub-verb, skipping global flags like `-C <dir>`.
fn git_read_only(args: &[String]) -> bool {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-C" | "-c" => {
                let _ = iter.next();
            }
            a if a.starts_with('-') => {}
            subverb => return GIT_READ_SUBVERBS.contains(&subverb),
        }
    }
    // Bare `git` just prints usage
    true
}

/// Reconstruct a printable form of the segment for pattern matching.
fn segment_text(segment: &[Token]) -> String {
    let mut parts = Vec::new();
    for token in segment {
        match token {
            Token::Word(w) => parts.push(w.text.clone()),
            Token::Redirect(r) => parts.push(r.op.clone()),
            Token::ProcSub(p) => {
                let bracket = if p.write { ">(" } else { "<(" };
                parts.push(format!("{}{})", bracket, p.body));
            }
            Token::Op(_) => {}
        }
    }
    parts.join(" ")
}

fn matches_pattern(text: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| {
        let p = p.trim();
        !p.is_empty() && (text == p || text.starts_with(&format!("{p} ")))
    })
}

/// Positional words with env-var assignments and wrappers stripped.
fn positional_words(segment: &[Token]) -> Vec<String> {
    let mut words: Vec<&Word> = segment
        .iter()
        .filter_map(|t| match t {
            Token::Word(w) => Some(w),
            _ => None,
        })
        .collect();

    // Leading VAR=value assignments
    while let Some(first) = words.first() {
        if !first.quoted && is_assignment(&first.text) {
            words.remove(0);
        } else {
            break;
        }
    }

    // Wrappers like `command`, `env`, `nohup` defer to the wrapped command
    while let Some(first) = words.first() {
        let head = basename(&first.text);
        if WRAPPER_COMMANDS.contains(&head) {
            words.remove(0);
            // env takes its own assignments
            while let Some(next) = words.first() {
                if is_assignment(&next.text) || next.text.starts_with('-') {
                    words.remove(0);
                } else {
                    break;
                }
            }
        } else {
            break;
        }
    }

    words.iter().map(|w| w.text.clone()).collect()
}

fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .enumerate()
                    .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
        }
        None => false,
    }
}

fn basename(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

fn has_in_place_flag(args: &[String]) -> bool {
    args.iter().any(|a| {
        a == "--in-place"
            || a.starts_with("--in-place=")
            // -i, -i.bak, and single-dash clusters like -ri; `i` is not a
            // valid sed flag letter in any other position
            || (a.starts_with('-') && !a.starts_with("--") && a.contains('i'))
    })
}

/// True when an awk program text redirects print output into a file.
fn awk_writes_file(args: &[String]) -> bool {
    // The program is the first argument that is not a flag or a flag value.
    let mut iter = args.iter().peekable();
    let mut program = None;
    while let Some(arg) = iter.next() {
        if arg == "-f" || arg == "-v" || arg == "-F" {
            let _ = iter.next();
        } else if arg.starts_with('-') && arg.len() > 1 {
            // other flags, possibly with attached values
        } else {
            program = Some(arg.as_str());
            break;
        }
    }
    let Some(program) = program else {
        return false;
    };
    contains_output_redirect(program)
}

/// Detect `>` / `>>` used as print redirection inside script text.
///
/// Only a `>` appearing after a `print`/`printf` keyword counts, so
/// comparisons like `$1 > 5` in patterns stay read-only.
fn contains_output_redirect(script: &str) -> bool {
    let Some(print_at) = script.find("print") else {
        return false;
    };
    let bytes = script.as_bytes();
    for (i, &b) in bytes.iter().enumerate().skip(print_at) {
        if b != b'>' {
            continue;
        }
        let prev = i.checked_sub(1).map(|j| bytes[j]);
        // `>=`, `->`, `=>`, `!>` and friends are not redirections
        if matches!(prev, Some(b'<') | Some(b'=') | Some(b'!') | Some(b'-')) {
            continue;
        }
        if bytes.get(i + 1) == Some(&b'=') {
            continue;
        }
        return true;
    }
    false
}

fn find_writes(args: &[String]) -> bool {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-delete" => return true,
            "-exec" | "-execdir" | "-ok" | "-okdir" => {
                if let Some(cmd) = iter.next() {
                    if WRITE_COMMANDS.contains(&basename(cmd)) {
                        return true;
                    }
                }
            }
            _ => {}
        }
    }
    false
}

/// `xargs [flags] cmd args…` is judged by the wrapped command.
fn xargs_read_only(args: &[String], opts: &ClassifyOptions) -> bool {
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.peek() {
        let arg = arg.as_str();
        if arg == "-I" || arg == "-n" || arg == "-P" || arg == "-d" || arg == "-s" {
            iter.next();
            iter.next();
        } else if arg.starts_with('-') && arg.len() > 1 {
            iter.next();
        } else {
            break;
        }
    }
    let wrapped: Vec<String> = iter.cloned().collect();
    if wrapped.is_empty() {
        // Bare xargs echoes its input
        return true;
    }
    is_read_only(&wrapped.join(" "), opts)
}

fn subverb_allowed(args: &[String], allowed: &[&str]) -> bool {
    let Some(subverb) = args.iter().find(|a| !a.starts_with('-')) else {
        // `pip --version` and friends
        return true;
    };
    allowed.contains(&subverb.as_str())
}

/// `python -c`/`-m` one-liners are allowed; running a script file is not.
fn python_read_only(args: &[String]) -> bool {
    match args.first() {
        None => true,
        Some(first) => PYTHON_READ_FLAGS.contains(&first.as_str()),
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
