// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-delivery correlation map.
//!
//! When an adapter enqueues a message it remembers where the eventual
//! reply should go, keyed by `messageId`. Entries are in-memory only: an
//! adapter restart forgets them, and the matching responses are then
//! discarded by the scan loop rather than delivered to the wrong place.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use ferry_core::DeliveryTarget;

struct Entry {
    target: DeliveryTarget,
    inserted_at: Instant,
}

/// Map of `messageId` to delivery target, with lazy TTL eviction.
pub struct PendingDeliveries {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl PendingDeliveries {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn insert(&self, message_id: impl Into<String>, target: DeliveryTarget) {
        self.entries.insert(
            message_id.into(),
            Entry {
                target,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes and returns the target for a message id. Expired entries
    /// return `None`; the caller treats that like a missing entry.
    pub fn take(&self, message_id: &str) -> Option<DeliveryTarget> {
        let (_, entry) = self.entries.remove(message_id)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.target)
    }

    /// Drops entries older than the TTL. Called opportunistically from
    /// the scan loop; nothing depends on eviction being prompt.
    pub fn evict_expired(&self) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
    }

    /// Snapshot of targets still awaiting replies, for typing refresh.
    pub fn targets(&self) -> Vec<DeliveryTarget> {
        self.entries
            .iter()
            .map(|entry| entry.value().target.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(chat_id: &str) -> DeliveryTarget {
        DeliveryTarget {
            chat_id: chat_id.to_string(),
            reply_to: None,
        }
    }

    #[test]
    fn take_removes_the_entry() {
        let pending = PendingDeliveries::new(Duration::from_secs(300));
        pending.insert("id-1", target("chat-1"));

        let taken = pending.take("id-1").unwrap();
        assert_eq!(taken.chat_id, "chat-1");
        assert!(pending.take("id-1").is_none());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let pending = PendingDeliveries::new(Duration::ZERO);
        pending.insert("id-1", target("chat-1"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(pending.take("id-1").is_none());
    }

    #[test]
    fn evict_expired_drops_old_entries() {
        let pending = PendingDeliveries::new(Duration::ZERO);
        pending.insert("id-1", target("chat-1"));
        std::thread::sleep(Duration::from_millis(5));
        pending.evict_expired();
        assert!(pending.is_empty());
    }

    #[test]
    fn targets_lists_waiting_chats() {
        let pending = PendingDeliveries::new(Duration::from_secs(300));
        pending.insert("id-1", target("chat-1"));
        pending.insert("id-2", target("chat-2"));
        assert_eq!(pending.targets().len(), 2);
    }
}
