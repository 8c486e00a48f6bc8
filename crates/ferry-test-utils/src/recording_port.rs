// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter that records what would have been sent.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{ChannelPort, DeliveryTarget, FerryError};

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub chat_id: String,
    pub text: String,
}

/// A channel adapter that records deliveries instead of sending them.
pub struct RecordingPort {
    channel: String,
    max_len: Option<usize>,
    deliveries: Mutex<Vec<Delivery>>,
    typing_count: AtomicUsize,
    fail_deliveries: AtomicBool,
}

impl RecordingPort {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            max_len: None,
            deliveries: Mutex::new(Vec::new()),
            typing_count: AtomicUsize::new(0),
            fail_deliveries: AtomicBool::new(false),
        }
    }

    /// Caps outgoing message length, like a real platform does.
    pub fn with_max_len(channel: impl Into<String>, max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::new(channel)
        }
    }

    /// When set, every `deliver` call fails with a channel error.
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail_deliveries.store(fail, Ordering::SeqCst);
    }

    /// All deliveries recorded so far, in order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    /// How many typing indicators were requested.
    pub fn typing_count(&self) -> usize {
        self.typing_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelPort for RecordingPort {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn max_message_length(&self) -> Option<usize> {
        self.max_len
    }

    async fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), FerryError> {
        if self.fail_deliveries.load(Ordering::SeqCst) {
            return Err(FerryError::Channel {
                message: "injected delivery failure".to_string(),
                source: None,
            });
        }
        self.deliveries.lock().await.push(Delivery {
            chat_id: target.chat_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, _target: &DeliveryTarget) -> Result<(), FerryError> {
        self.typing_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DeliveryTarget {
        DeliveryTarget {
            chat_id: "chat-1".to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn records_deliveries_in_order() {
        let port = RecordingPort::new("telegram");
        port.deliver(&target(), "one").await.unwrap();
        port.deliver(&target(), "two").await.unwrap();

        let sent = port.deliveries().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "one");
        assert_eq!(sent[1].text, "two");
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_channel_error() {
        let port = RecordingPort::new("discord");
        port.fail_deliveries(true);
        let err = port.deliver(&target(), "x").await.unwrap_err();
        assert!(matches!(err, FerryError::Channel { .. }));
        assert!(port.deliveries().await.is_empty());
    }
}
