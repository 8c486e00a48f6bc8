// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI provider with scripted replies and failure injection.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{AiProvider, FerryError};

/// One recorded invocation: the message text and whether a fresh context
/// was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub message: String,
    pub fresh_context: bool,
}

/// A mock AI provider that returns pre-scripted outcomes.
///
/// Outcomes are popped from a FIFO queue; an empty queue yields a default
/// "mock reply". Every invocation is recorded, and the provider tracks the
/// maximum number of concurrent invocations it observed so tests can
/// assert the one-in-flight contract.
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<ProviderCall>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Self::with_script(Vec::new())
    }

    /// Pre-loads the outcome queue: `Ok` entries are replies, `Err`
    /// entries are provider failures with the given message.
    pub fn with_script(script: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(script)),
            calls: Mutex::new(Vec::new()),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Like [`MockProvider::with_script`] but each invocation holds for
    /// the given delay, widening the window for concurrency violations.
    pub fn with_script_and_delay(
        script: Vec<Result<String, String>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(script)),
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Appends a reply to the end of the script.
    pub async fn push_reply(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Ok(text.into()));
    }

    /// Appends a failure to the end of the script.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Err(message.into()));
    }

    /// All invocations recorded so far, in order.
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    /// Highest number of invocations that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    async fn invoke(&self, message: &str, fresh_context: bool) -> Result<String, FerryError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls.lock().await.push(ProviderCall {
            message: message.to_string(),
            fresh_context,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock reply".to_string()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        outcome.map_err(|message| FerryError::Provider {
            message,
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_outcomes_pop_in_order() {
        let provider = MockProvider::with_script(vec![
            Ok("first".to_string()),
            Err("boom".to_string()),
            Ok("second".to_string()),
        ]);

        assert_eq!(provider.invoke("a", false).await.unwrap(), "first");
        assert!(provider.invoke("b", false).await.is_err());
        assert_eq!(provider.invoke("c", true).await.unwrap(), "second");
        // Exhausted script falls back to the default reply.
        assert_eq!(provider.invoke("d", false).await.unwrap(), "mock reply");
    }

    #[tokio::test]
    async fn invocations_are_recorded() {
        let provider = MockProvider::new();
        provider.invoke("hello", true).await.unwrap();
        provider.invoke("again", false).await.unwrap();

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].message, "hello");
        assert!(calls[0].fresh_context);
        assert!(!calls[1].fresh_context);
    }
}
