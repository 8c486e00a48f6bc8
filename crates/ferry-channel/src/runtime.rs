// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel-generic runtime around a [`ChannelPort`].
//!
//! Handles the queue side of an adapter: eligibility filtering and reset
//! handling on the way in, and the outgoing scan loop with
//! pending-delivery correlation on the way out. The port only knows how
//! to talk to its platform.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ferry_config::ChannelConfig;
use ferry_core::{
    ChannelPort, DeliveryTarget, FerryError, MessageRecord, Stage, is_reset_command, now_millis,
};
use ferry_queue::{QueueStore, ResetFlag};

use crate::pending::PendingDeliveries;
use crate::split::split_message;

/// Immediate reply to a reset command. Resets never go through the queue.
const RESET_REPLY: &str = "Conversation context will restart with your next message.";

/// What `handle_inbound` did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Message not eligible for processing; nothing was queued.
    Ignored,
    /// Reset command handled locally; nothing was queued.
    Reset,
    /// Message enqueued under this id.
    Enqueued(String),
}

/// Per-adapter runtime tying a port to the shared queue store.
pub struct ChannelRuntime {
    port: Arc<dyn ChannelPort>,
    store: QueueStore,
    reset: ResetFlag,
    pending: PendingDeliveries,
    poll_interval: Duration,
    typing_refresh: Duration,
}

impl ChannelRuntime {
    pub fn new(port: Arc<dyn ChannelPort>, store: QueueStore, config: &ChannelConfig) -> Self {
        let reset = ResetFlag::new(store.root());
        Self {
            port,
            store,
            reset,
            pending: PendingDeliveries::new(Duration::from_secs(config.pending_ttl_secs)),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            typing_refresh: Duration::from_secs(config.typing_refresh_secs),
        }
    }

    /// Handles one inbound platform message.
    ///
    /// Empty bodies are ignored. A reset command is handled entirely
    /// locally: the durable flag is raised and the confirmation goes
    /// straight back to the platform, bypassing the queue. Anything else
    /// becomes a canonical record in `incoming` with a pending-delivery
    /// entry so the eventual reply finds its way back.
    pub async fn handle_inbound(
        &self,
        sender: &str,
        sender_id: Option<String>,
        target: DeliveryTarget,
        text: &str,
    ) -> Result<Inbound, FerryError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Inbound::Ignored);
        }

        if is_reset_command(text) {
            self.reset.set()?;
            info!(channel = self.port.channel(), "reset command received");
            self.port.deliver(&target, RESET_REPLY).await?;
            return Ok(Inbound::Reset);
        }

        let mut record = MessageRecord::new(self.port.channel(), sender, text);
        record.sender_id = sender_id;

        self.store.enqueue(&record)?;
        self.pending.insert(record.message_id.clone(), target.clone());
        debug!(
            channel = record.channel.as_str(),
            sender,
            message_id = record.message_id.as_str(),
            "inbound message queued"
        );

        // Typing is best-effort; a failure must not affect the queue.
        if let Err(e) = self.port.send_typing(&target).await {
            debug!(error = %e, "typing indicator failed");
        }

        Ok(Inbound::Enqueued(record.message_id))
    }

    /// Runs the outgoing scan loop until the token is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            channel = self.port.channel(),
            interval_secs = self.poll_interval.as_secs(),
            "channel runtime started"
        );
        let mut scan = tokio::time::interval(self.poll_interval);
        let mut typing = tokio::time::interval(self.typing_refresh);
        loop {
            tokio::select! {
                _ = scan.tick() => {
                    if let Err(e) = self.scan_outgoing_once().await {
                        error!(channel = self.port.channel(), error = %e, "outgoing scan failed");
                    }
                }
                _ = typing.tick() => {
                    self.refresh_typing().await;
                }
                _ = shutdown.cancelled() => {
                    info!(channel = self.port.channel(), "channel runtime shutting down");
                    break;
                }
            }
        }
    }

    /// One pass over `outgoing` for this channel. Returns how many
    /// responses were delivered.
    ///
    /// A response with no pending entry (expired, or the adapter
    /// restarted since enqueueing) has no recoverable recipient; it is
    /// discarded so it cannot block the stage forever.
    pub async fn scan_outgoing_once(&self) -> Result<usize, FerryError> {
        self.pending.evict_expired();

        let mut delivered = 0;
        for file_name in self.store.list_outgoing(self.port.channel())? {
            let response = match self.store.read_response(&file_name) {
                Ok(response) => response,
                Err(e) => {
                    warn!(file = file_name.as_str(), error = %e, "unreadable response; discarding");
                    self.store.discard(Stage::Outgoing, &file_name)?;
                    continue;
                }
            };

            match self.pending.take(&response.message_id) {
                Some(target) => {
                    if let Err(e) = self.deliver(&target, &response.message).await {
                        // Platform hiccup: put the target back so the next
                        // scan retries instead of treating the response as
                        // an orphan.
                        self.pending.insert(response.message_id.clone(), target);
                        return Err(e);
                    }
                    self.store.discard(Stage::Outgoing, &file_name)?;
                    delivered += 1;
                    info!(
                        channel = response.channel.as_str(),
                        message_id = response.message_id.as_str(),
                        "response delivered"
                    );
                }
                None => {
                    let age_ms = now_millis().saturating_sub(response.timestamp);
                    warn!(
                        message_id = response.message_id.as_str(),
                        age_ms, "no pending delivery for response; discarding"
                    );
                    self.store.discard(Stage::Outgoing, &file_name)?;
                }
            }
        }
        Ok(delivered)
    }

    /// Sends the reply, split into multiple platform messages when the
    /// port enforces a maximum length.
    async fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), FerryError> {
        match self.port.max_message_length() {
            Some(max_len) => {
                for chunk in split_message(text, max_len) {
                    self.port.deliver(target, &chunk).await?;
                }
                Ok(())
            }
            None => self.port.deliver(target, text).await,
        }
    }

    async fn refresh_typing(&self) {
        if self.pending.is_empty() {
            return;
        }
        for target in self.pending.targets() {
            if let Err(e) = self.port.send_typing(&target).await {
                debug!(channel = self.port.channel(), error = %e, "typing refresh failed");
            }
        }
    }
}
