// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-target extraction.
//!
//! Pulls the file paths a command would create or modify so the caller
//! can test them against protected locations: output redirection targets,
//! `tee` arguments, process-substitution bodies (recursed), the
//! destination argument of copy-like commands, every positional argument
//! of delete/create commands, and `dd`'s `of=`.

use crate::lexer::{split_segments, tokenize, Token};

/// Commands whose final positional argument is the write destination.
const DEST_LAST_COMMANDS: &[&str] = &["cp", "mv", "install", "ln", "link", "symlink"];

/// Commands whose every positional argument is a write target.
const DEST_ALL_COMMANDS: &[&str] = &[
    "touch", "truncate", "rm", "rmdir", "unlink", "shred", "mkdir",
];

/// Extract the write targets of a command line.
pub fn write_targets(command: &str) -> Vec<String> {
    let tokens = tokenize(command);
    let mut targets = Vec::new();
    for segment in split_segments(&tokens) {
        segment_targets(&segment, &mut targets);
    }
    targets
}

fn segment_targets(segment: &[Token], targets: &mut Vec<String>) {
    // Redirection targets: the word following an output redirect that
    // is not a pure fd duplication.
    let mut expect_target = false;
    for token in segment {
        match token {
            Token::Redirect(r) => {
                expect_target = r.is_output() && !r.is_fd_duplication();
            }
            Token::Word(w) if expect_target => {
                targets.push(w.text.clone());
                expect_target = false;
            }
            Token::ProcSub(sub) => {
                expect_target = false;
                // Writing into `>(…)` hands the data to the inner command;
                // whatever that command writes is the real target.
                targets.extend(write_targets(&sub.body));
            }
            _ => expect_target = false,
        }
    }

    let words: Vec<&str> = segment
        .iter()
        .filter_map(|t| match t {
            Token::Word(w) => Some(w.text.as_str()),
            _ => None,
        })
        .collect();
    let Some((&head, args)) = words.split_first() else {
        return;
    };
    let head = head.rsplit('/').next().unwrap_or(head);

    let positionals: Vec<&str> = args
        .iter()
        .copied()
        .filter(|a| !a.starts_with('-'))
        .collect();

    if head == "tee" {
        targets.extend(positionals.iter().map(|s| s.to_string()));
    } else if DEST_LAST_COMMANDS.contains(&head) {
        if let Some(last) = positionals.last() {
            targets.push(last.to_string());
        }
    } else if DEST_ALL_COMMANDS.contains(&head) {
        targets.extend(positionals.iter().map(|s| s.to_string()));
    } else if head == "dd" {
        for arg in args {
            if let Some(of) = arg.strip_prefix("of=") {
                targets.push(of.to_string());
            }
        }
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
