// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI provider invocation over a child-process CLI.

mod cli;

pub use cli::CliProvider;
