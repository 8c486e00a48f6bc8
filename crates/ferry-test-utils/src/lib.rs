// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock collaborators for Ferry tests.
//!
//! `MockProvider` and `RecordingPort` stand in for the AI CLI and a chat
//! platform, enabling fast, CI-runnable tests without external processes
//! or network access.

mod mock_provider;
mod recording_port;

pub use mock_provider::{MockProvider, ProviderCall};
pub use recording_port::{Delivery, RecordingPort};
