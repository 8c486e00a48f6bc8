// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter runtime.
//!
//! A platform adapter implements [`ferry_core::ChannelPort`] for its
//! platform's transport; everything channel-generic lives here: inbound
//! eligibility and reset handling, the pending-delivery correlation map,
//! the outgoing scan loop, and reply splitting for length-capped
//! platforms.

mod pending;
mod runtime;
mod split;

pub use pending::PendingDeliveries;
pub use runtime::{ChannelRuntime, Inbound};
pub use split::split_message;
