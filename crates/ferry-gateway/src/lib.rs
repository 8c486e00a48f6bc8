// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP ingress.
//!
//! A small axum surface for enqueueing messages from arbitrary HTTP
//! clients and inspecting queue state. It shares the queue store with the
//! processor and the channel adapters; it never talks to the provider.

mod handlers;
mod server;

pub use server::{GatewayState, serve};
