// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ferry message router.

use thiserror::Error;

/// The primary error type used across all Ferry crates.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue store errors (failed write, rename, or read of a stage record).
    #[error("queue error at {path}: {source}")]
    Queue {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A queue record could not be serialized or deserialized.
    #[error("record codec error at {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// AI provider errors (non-zero exit, spawn failure, malformed output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Channel adapter errors (delivery failure, platform rejection).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FerryError {
    /// True when the failure originated in the AI provider rather than in
    /// queue mechanics. Provider failures produce a user-visible fallback
    /// reply; everything else is retried by requeueing.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            FerryError::Provider { .. } | FerryError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_and_timeout_are_provider_errors() {
        let provider = FerryError::Provider {
            message: "exit status 1".into(),
            source: None,
        };
        let timeout = FerryError::Timeout {
            duration: std::time::Duration::from_secs(300),
        };
        assert!(provider.is_provider_error());
        assert!(timeout.is_provider_error());
    }

    #[test]
    fn queue_errors_are_not_provider_errors() {
        let queue = FerryError::Queue {
            path: "/tmp/queue/incoming/x.json".into(),
            source: std::io::Error::other("disk full"),
        };
        assert!(!queue.is_provider_error());
        assert!(!FerryError::Internal("boom".into()).is_provider_error());
    }

    #[test]
    fn display_includes_context() {
        let err = FerryError::Queue {
            path: "incoming/a.json".into(),
            source: std::io::Error::other("no space"),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("incoming/a.json"));
        assert!(rendered.contains("no space"));
    }
}
