// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the router's two external seams: the AI provider
//! invoked by the sequential processor, and the platform port a channel
//! runtime delivers replies through.

use async_trait::async_trait;

use crate::error::FerryError;
use crate::types::DeliveryTarget;

/// Synchronous (from the processor's point of view) AI invocation.
///
/// Implementations wrap whatever actually produces a reply: the external
/// CLI in production, a scripted queue in tests. The processor guarantees
/// at most one call is in flight at any time.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Invokes the provider with the message text.
    ///
    /// `fresh_context` starts a new conversation instead of continuing the
    /// prior one; it is set for exactly the first invocation after the
    /// durable reset flag was taken.
    async fn invoke(&self, message: &str, fresh_context: bool) -> Result<String, FerryError>;
}

/// Platform-facing side of a channel adapter.
///
/// The generic channel runtime owns queue polling, correlation, and reply
/// splitting; a port only knows how to push text at a platform target.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    /// Channel name this port serves; used as the queue record prefix.
    fn channel(&self) -> &str;

    /// Hard per-message length limit of the platform, if it has one.
    /// Replies longer than this are split before delivery.
    fn max_message_length(&self) -> Option<usize> {
        None
    }

    /// Delivers one chunk of reply text to the target.
    async fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), FerryError>;

    /// Best-effort presence indicator shown while a reply is pending.
    /// Ports without the concept keep the default no-op.
    async fn send_typing(&self, _target: &DeliveryTarget) -> Result<(), FerryError> {
        Ok(())
    }
}
