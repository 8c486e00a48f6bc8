// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential queue processor.
//!
//! One logical thread of control drains `incoming` oldest-first and holds
//! exactly one AI invocation in flight at any time, globally, across all
//! channels. The provider's continuation flag is stateful on the provider
//! side, so concurrent calls would interleave conversation state; the
//! whole stage design exists to prevent that.
//!
//! Per record: claim, consume the durable reset flag, invoke the
//! provider, write the response to `outgoing`, then delete the
//! `processing` copy. Provider failures become a user-visible fallback
//! reply; queue failures requeue the record for retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ferry_config::ProcessorConfig;
use ferry_core::{AiProvider, FerryError, MessageRecord, ResponseRecord, now_millis};
use ferry_queue::{PendingEntry, QueueStore, ResetFlag};

/// Reply sent when the provider itself fails. Never expose internal error
/// detail to the chat platform; it goes to the log instead.
const FALLBACK_REPLY: &str =
    "Sorry, I ran into an error processing your message. Please try again.";

/// Appended to replies cut at the delivery length cap.
const TRUNCATION_MARKER: &str = "… [truncated]";

/// The single long-lived worker between `incoming` and `outgoing`.
pub struct SequentialProcessor {
    store: QueueStore,
    reset: ResetFlag,
    provider: Arc<dyn AiProvider>,
    poll_interval: Duration,
    max_reply_chars: usize,
}

impl SequentialProcessor {
    pub fn new(store: QueueStore, provider: Arc<dyn AiProvider>, config: &ProcessorConfig) -> Self {
        let reset = ResetFlag::new(store.root());
        Self {
            store,
            reset,
            provider,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_reply_chars: config.max_reply_chars,
        }
    }

    /// Runs the poll loop until the token is cancelled.
    ///
    /// The startup recovery sweep runs before the first poll: records
    /// stranded in `processing` by a previous crash are requeued so they
    /// are retried instead of silently lost.
    pub async fn run(&self, shutdown: CancellationToken) {
        match self.store.recover() {
            Ok(0) => {}
            Ok(n) => info!(recovered = n, "requeued records stranded by previous run"),
            Err(e) => error!(error = %e, "startup recovery sweep failed"),
        }
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "processor started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(&shutdown).await {
                        error!(error = %e, "queue poll failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("processor shutting down");
                    break;
                }
            }
        }
    }

    /// Drains everything currently pending, strictly one record at a
    /// time. Returns the number of records processed. Stops early on
    /// shutdown; a claimed-but-unfinished record stays in `processing`
    /// and is recovered on the next start.
    pub async fn poll_once(&self, shutdown: &CancellationToken) -> Result<usize, FerryError> {
        let pending = self.store.list_pending()?;
        let mut processed = 0;
        for entry in pending {
            if shutdown.is_cancelled() {
                break;
            }
            self.process_entry(&entry).await;
            processed += 1;
        }
        Ok(processed)
    }

    async fn process_entry(&self, entry: &PendingEntry) {
        let record = match self.store.claim(&entry.file_name) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                error!(file = entry.file_name.as_str(), error = %e, "claim failed");
                return;
            }
        };

        debug!(
            channel = record.channel.as_str(),
            sender = record.sender.as_str(),
            message_id = record.message_id.as_str(),
            "processing message"
        );

        let fresh_context = match self.reset.take() {
            Ok(fresh) => fresh,
            Err(e) => {
                // Local queue-mechanics failure: requeue rather than risk
                // invoking with the wrong context.
                error!(error = %e, "could not read reset flag; requeueing");
                self.requeue(&entry.file_name);
                return;
            }
        };

        let started = Instant::now();
        let reply = match self.provider.invoke(&record.message, fresh_context).await {
            Ok(raw) => self.finalize_reply(&raw),
            Err(e) => {
                // Provider failures always produce a user-visible reply;
                // silently dropping a message is worse than apologizing.
                error!(
                    channel = record.channel.as_str(),
                    message_id = record.message_id.as_str(),
                    error = %e,
                    "provider invocation failed"
                );
                FALLBACK_REPLY.to_string()
            }
        };

        let provider_ms = started.elapsed().as_millis() as u64;
        if let Err(e) = self.finish(&entry.file_name, &record, reply, provider_ms) {
            error!(
                file = entry.file_name.as_str(),
                error = %e,
                "failed to record response; requeueing"
            );
            self.requeue(&entry.file_name);
        }
    }

    /// Write-then-delete: the response must be durable in `outgoing`
    /// before the `processing` copy goes away, so a crash between the two
    /// leaves the record recoverable.
    fn finish(
        &self,
        file_name: &str,
        record: &MessageRecord,
        reply: String,
        provider_ms: u64,
    ) -> Result<(), FerryError> {
        let chars = reply.chars().count();
        let response = ResponseRecord {
            channel: record.channel.clone(),
            sender: record.sender.clone(),
            message: reply,
            original_message: record.message.clone(),
            timestamp: now_millis(),
            message_id: record.message_id.clone(),
        };
        self.store.enqueue_response(&response)?;
        self.store.complete(file_name)?;
        info!(
            channel = record.channel.as_str(),
            message_id = record.message_id.as_str(),
            chars,
            provider_ms,
            "response ready"
        );
        Ok(())
    }

    fn requeue(&self, file_name: &str) {
        if let Err(e) = self.store.fail(file_name) {
            warn!(file = file_name, error = %e, "requeue failed; record stays in processing for recovery");
        }
    }

    /// Trims the raw reply and enforces the delivery length cap. A cut
    /// reply gets the truncation marker appended; the total stays within
    /// the cap.
    fn finalize_reply(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.chars().count() <= self.max_reply_chars {
            return trimmed.to_string();
        }
        let marker_len = TRUNCATION_MARKER.chars().count();
        let keep = self.max_reply_chars.saturating_sub(marker_len);
        let mut cut: String = trimmed.chars().take(keep).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::tempdir;

    use ferry_core::{HEARTBEAT_CHANNEL, Stage};
    use ferry_test_utils::MockProvider;

    fn config() -> ProcessorConfig {
        ProcessorConfig {
            poll_interval_secs: 1,
            max_reply_chars: 4000,
        }
    }

    fn record(channel: &str, message_id: &str, timestamp: i64, message: &str) -> MessageRecord {
        MessageRecord {
            channel: channel.into(),
            sender: "Alice".into(),
            sender_id: None,
            message: message.into(),
            timestamp,
            message_id: message_id.into(),
        }
    }

    #[tokio::test]
    async fn processes_in_enqueue_order_across_channels() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("discord", "3_c", 300, "third")).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "first")).unwrap();
        store.enqueue(&record("webhook", "2_b", 200, "second")).unwrap();

        let provider = MockProvider::new();
        let processor = SequentialProcessor::new(store, provider.clone(), &config());
        let processed = processor
            .poll_once(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed, 3);

        let messages: Vec<String> = provider
            .calls()
            .await
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn one_invocation_in_flight() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        for i in 0..5 {
            store
                .enqueue(&record("telegram", &format!("{i}_x"), i, "msg"))
                .unwrap();
        }

        let provider = MockProvider::with_script_and_delay(Vec::new(), Duration::from_millis(20));
        let processor = SequentialProcessor::new(store, provider.clone(), &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        assert_eq!(provider.calls().await.len(), 5);
        assert_eq!(provider.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn success_moves_record_to_outgoing() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "hello")).unwrap();

        let provider = MockProvider::with_script(vec![Ok("hi there".to_string())]);
        let processor = SequentialProcessor::new(store.clone(), provider, &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.incoming, 0);
        assert_eq!(counts.processing, 0);
        assert_eq!(counts.outgoing, 1);

        let names = store.list_outgoing("telegram").unwrap();
        let response = store.read_response(&names[0]).unwrap();
        assert_eq!(response.message, "hi there");
        assert_eq!(response.original_message, "hello");
        assert_eq!(response.message_id, "1_a");
    }

    #[tokio::test]
    async fn provider_failure_yields_fallback_reply() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("discord", "1_a", 100, "hello")).unwrap();

        let provider = MockProvider::with_script(vec![Err("exit code 1".to_string())]);
        let processor = SequentialProcessor::new(store.clone(), provider, &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        // Never silently dropped: the adapter still gets a reply.
        let names = store.list_outgoing("discord").unwrap();
        assert_eq!(names.len(), 1);
        let response = store.read_response(&names[0]).unwrap();
        assert_eq!(response.message, FALLBACK_REPLY);
        assert_eq!(store.counts().unwrap().processing, 0);
    }

    #[tokio::test]
    async fn reset_flag_applies_to_exactly_one_invocation() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "first")).unwrap();
        store.enqueue(&record("telegram", "2_b", 200, "second")).unwrap();

        ResetFlag::new(dir.path()).set().unwrap();

        let provider = MockProvider::new();
        let processor = SequentialProcessor::new(store, provider.clone(), &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        let calls = provider.calls().await;
        assert!(calls[0].fresh_context);
        assert!(!calls[1].fresh_context);
        assert!(!ResetFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn long_reply_is_truncated_with_marker() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "hello")).unwrap();

        let cfg = ProcessorConfig {
            poll_interval_secs: 1,
            max_reply_chars: 100,
        };
        let provider = MockProvider::with_script(vec![Ok("x".repeat(500))]);
        let processor = SequentialProcessor::new(store.clone(), provider, &cfg);
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        let names = store.list_outgoing("telegram").unwrap();
        let response = store.read_response(&names[0]).unwrap();
        assert_eq!(response.message.chars().count(), 100);
        assert!(response.message.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn reply_is_trimmed_but_not_cut_under_the_cap() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "hello")).unwrap();

        let provider = MockProvider::with_script(vec![Ok("  spaced out \n".to_string())]);
        let processor = SequentialProcessor::new(store.clone(), provider, &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        let names = store.list_outgoing("telegram").unwrap();
        let response = store.read_response(&names[0]).unwrap();
        assert_eq!(response.message, "spaced out");
    }

    #[tokio::test]
    async fn heartbeat_response_uses_bare_file_name() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store
            .enqueue(&record(HEARTBEAT_CHANNEL, "9_z", 100, "ping"))
            .unwrap();

        let provider = MockProvider::new();
        let processor = SequentialProcessor::new(store.clone(), provider, &config());
        processor.poll_once(&CancellationToken::new()).await.unwrap();

        assert!(
            dir.path()
                .join(Stage::Outgoing.dir_name())
                .join("9_z.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn shutdown_stops_between_records() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(&record("telegram", "1_a", 100, "first")).unwrap();
        store.enqueue(&record("telegram", "2_b", 200, "second")).unwrap();

        let provider = MockProvider::new();
        let processor = SequentialProcessor::new(store.clone(), provider, &config());

        let token = CancellationToken::new();
        token.cancel();
        let processed = processor.poll_once(&token).await.unwrap();
        assert_eq!(processed, 0);
        assert_eq!(store.counts().unwrap().incoming, 2);
    }
}
