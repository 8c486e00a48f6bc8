// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical record types flowing through the queue, plus id and time helpers.
//!
//! Records serialize as camelCase JSON so the on-disk queue layout stays
//! readable and compatible with external tooling that inspects the stage
//! directories directly.

use std::sync::LazyLock;

use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reserved channel name whose responses are written under a bare
/// `{messageId}.json` filename for the monitoring collaborator.
pub const HEARTBEAT_CHANNEL: &str = "heartbeat";

/// Reset command pattern: a trimmed message body of `!reset` or `/reset`,
/// case-insensitive.
static RESET_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[!/]reset$").expect("reset pattern is valid"));

/// One of the three durable queue stages a record can occupy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Incoming,
    Processing,
    Outgoing,
}

impl Stage {
    /// Directory name for this stage under the queue root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Stage::Incoming => "incoming",
            Stage::Processing => "processing",
            Stage::Outgoing => "outgoing",
        }
    }
}

/// Canonical inbound unit: one user message normalized by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Originating channel (`whatsapp`, `discord`, `telegram`, `heartbeat`,
    /// or a caller-supplied string for webhook ingress).
    pub channel: String,
    /// Human-readable display name of the sender.
    pub sender: String,
    /// Stable platform identifier of the sender, when the platform has one.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Raw UTF-8 message text. Length limits are enforced on egress only.
    pub message: String,
    /// Creation instant, epoch milliseconds.
    pub timestamp: i64,
    /// Identifier unique within the channel partition, used for correlation.
    pub message_id: String,
}

impl MessageRecord {
    /// Builds a record with a generated timestamp and message id.
    pub fn new(
        channel: impl Into<String>,
        sender: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender: sender.into(),
            sender_id: None,
            message: message.into(),
            timestamp: now_millis(),
            message_id: generate_message_id(),
        }
    }

    /// The sender id, falling back to `{channel}:{sender}` when the
    /// platform did not supply one.
    pub fn resolved_sender_id(&self) -> String {
        self.sender_id
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.channel, self.sender))
    }

    /// Stage-scoped record key: `{channel}_{messageId}`.
    pub fn queue_key(&self) -> String {
        format!("{}_{}", self.channel, self.message_id)
    }
}

/// Canonical outbound reply unit, correlated to its [`MessageRecord`] by
/// `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub channel: String,
    pub sender: String,
    /// The AI reply, already trimmed and length-capped.
    pub message: String,
    /// The inbound text this reply answers.
    pub original_message: String,
    /// Creation instant of the response, epoch milliseconds.
    pub timestamp: i64,
    /// Equals the originating message's `message_id`.
    pub message_id: String,
}

/// Platform-specific reply target recorded by an adapter when it enqueues
/// a message, so the matching response can be delivered later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    /// Platform chat/conversation handle to deliver into.
    pub chat_id: String,
    /// Platform message reference to reply to, when supported.
    pub reply_to: Option<String>,
}

/// Current instant as integer epoch milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Generates a `{time}_{random}` message id, unique enough within a
/// channel partition for correlation purposes.
pub fn generate_message_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}_{}", now_millis(), suffix.to_lowercase())
}

/// True when the trimmed message body is a reset command (`!reset` or
/// `/reset`, case-insensitive).
pub fn is_reset_command(text: &str) -> bool {
    RESET_COMMAND.is_match(text.trim())
}
