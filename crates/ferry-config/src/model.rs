// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ferry message router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Ferry configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FerryConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Durable queue store settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Sequential processor settings.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// External AI CLI invocation settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Webhook HTTP ingress settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel adapter runtime settings.
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "ferry".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Durable queue store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Root directory holding the `incoming`, `processing`, and `outgoing`
    /// stage directories plus the reset flag.
    #[serde(default = "default_queue_root")]
    pub root_dir: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            root_dir: default_queue_root(),
        }
    }
}

fn default_queue_root() -> String {
    dirs::data_dir()
        .map(|p| p.join("ferry").join("queue"))
        .unwrap_or_else(|| std::path::PathBuf::from("queue"))
        .to_string_lossy()
        .into_owned()
}

/// Sequential processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Seconds between incoming-queue scans.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum delivered reply length in characters. Longer replies are
    /// truncated with a marker appended.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_max_reply_chars() -> usize {
    4000
}

/// External AI CLI invocation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Command line to invoke, split shell-style. The message text is
    /// passed as the final argument.
    #[serde(default = "default_provider_command")]
    pub command: String,

    /// Optional model selector forwarded to the CLI.
    #[serde(default)]
    pub model: Option<String>,

    /// Optional wall-clock cap on a single invocation, in seconds.
    /// `None` means unbounded, which is the documented default: AI replies
    /// may legitimately take a long time, and the single worker simply
    /// waits.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            model: None,
            timeout_secs: None,
        }
    }
}

fn default_provider_command() -> String {
    "claude -p".to_string()
}

/// Webhook HTTP ingress configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the webhook ingress.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3100
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Channel adapter runtime configuration, shared by every adapter instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Seconds between outgoing-queue scans.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds a pending delivery entry stays alive before eviction.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    /// Seconds between best-effort typing indicator refreshes while a
    /// reply is pending.
    #[serde(default = "default_typing_refresh_secs")]
    pub typing_refresh_secs: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            pending_ttl_secs: default_pending_ttl_secs(),
            typing_refresh_secs: default_typing_refresh_secs(),
        }
    }
}

fn default_pending_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_typing_refresh_secs() -> u64 {
    5
}
