// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ferry message router.
//!
//! This crate provides the canonical queue record types, the shared error
//! type, and the collaborator traits (AI provider, channel port) used
//! throughout the Ferry workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FerryError;
pub use traits::{AiProvider, ChannelPort};
pub use types::{
    DeliveryTarget, HEARTBEAT_CHANNEL, MessageRecord, ResponseRecord, Stage,
    generate_message_id, is_reset_command, now_millis,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_exists_in_exactly_one_stage_key_space() {
        // The `{channel}_{messageId}` key must be identical across stages
        // so a record can be located wherever it currently lives.
        let mut record = MessageRecord::new("telegram", "Alice", "hi");
        record.message_id = "1_a".into();
        assert_eq!(record.queue_key(), "telegram_1_a");
        // Stage never participates in the key.
        for stage in [Stage::Incoming, Stage::Processing, Stage::Outgoing] {
            assert!(!record.queue_key().contains(stage.dir_name()));
        }
    }

    #[test]
    fn trait_objects_are_constructible() {
        fn _assert_provider<T: AiProvider>() {}
        fn _assert_port<T: ChannelPort>() {}
    }
}
