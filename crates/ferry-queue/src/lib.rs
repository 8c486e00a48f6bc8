// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed durable message queue.
//!
//! Everything here is plain files and atomic renames; no database, no
//! daemon state. The queue root is the single source of truth shared by
//! the gateway, the processor, and the channel adapters.

mod reset;
mod store;

pub use reset::ResetFlag;
pub use store::{PendingEntry, QueueStore, RecordStatus, StageCounts};
