// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry reset` command implementation.
//!
//! Raises the durable reset flag, same as a `!reset` chat command would.
//! The next processed message starts a fresh provider context.

use ferry_config::FerryConfig;
use ferry_core::FerryError;
use ferry_queue::{QueueStore, ResetFlag};

/// Runs the `ferry reset` command.
pub fn run_reset(config: &FerryConfig) -> Result<(), FerryError> {
    // Open the store first so the queue root exists before the flag write.
    let store = QueueStore::open(&config.queue.root_dir)?;
    ResetFlag::new(store.root()).set()?;
    println!("reset requested: the next message starts a fresh context");
    Ok(())
}
