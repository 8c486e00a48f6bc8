// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single sequential worker that drains the incoming queue.

mod worker;

pub use worker::SequentialProcessor;
