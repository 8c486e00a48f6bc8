// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry status` command implementation.
//!
//! Reads the queue store directly; the store is the single source of
//! truth, so this works whether or not a `ferry serve` process is
//! running.

use serde::Serialize;

use ferry_config::FerryConfig;
use ferry_core::FerryError;
use ferry_queue::{QueueStore, ResetFlag};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusReport {
    queue_root: String,
    incoming: usize,
    processing: usize,
    outgoing: usize,
    reset_pending: bool,
}

/// Runs the `ferry status` command.
pub fn run_status(config: &FerryConfig, json: bool) -> Result<(), FerryError> {
    let store = QueueStore::open(&config.queue.root_dir)?;
    let counts = store.counts()?;
    let reset_pending = ResetFlag::new(store.root()).is_set();

    let report = StatusReport {
        queue_root: config.queue.root_dir.clone(),
        incoming: counts.incoming,
        processing: counts.processing,
        outgoing: counts.outgoing,
        reset_pending,
    };

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| FerryError::Internal(format!("status serialization failed: {e}")))?;
        println!("{rendered}");
    } else {
        println!("queue root:  {}", report.queue_root);
        println!("incoming:    {}", report.incoming);
        println!("processing:  {}", report.processing);
        println!("outgoing:    {}", report.outgoing);
        println!(
            "reset:       {}",
            if report.reset_pending {
                "pending for next message"
            } else {
                "not requested"
            }
        );
    }
    Ok(())
}
