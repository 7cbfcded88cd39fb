// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ccs todos` — the one-shot ticket consumer.
//!
//! `todos clear` is the single CLI invocation the `api.todos_clear`
//! capability ticket grants. Without an active ticket it refuses.

use ccs_core::ProjectPaths;
use ccs_state::StateStore;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TodosAction {
    /// Clear all todo lists (requires an active one-shot permission)
    Clear,
}

pub fn run(action: TodosAction) -> i32 {
    match action {
        TodosAction::Clear => clear(),
    }
}

fn clear() -> i32 {
    let Ok(cwd) = std::env::current_dir() else {
        eprintln!("cannot determine working directory");
        return 1;
    };
    let store = StateStore::new(&ProjectPaths::discover(&cwd));

    let cleared = store.edit(|state| {
        if !state.flags.api.todos_clear {
            return false;
        }
        state.flags.api.todos_clear = false;
        state.todos.active.clear();
        state.todos.stashed.clear();
        state.todos.parent_snapshot = None;
        true
    });

    match cleared {
        Ok(true) => {
            println!("todos cleared");
            0
        }
        Ok(false) => {
            eprintln!(
                "no todos-clear permission is active; it is granted once after \
                 a stashed list is restored"
            );
            1
        }
        Err(e) => {
            eprintln!("failed to clear todos: {e}");
            1
        }
    }
}

#[cfg(test)]
#[path = "todos_tests.rs"]
mod tests;
