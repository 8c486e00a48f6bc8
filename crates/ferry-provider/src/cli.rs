// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Child-process CLI provider.
//!
//! Invokes the configured AI CLI once per message and returns its stdout
//! as the reply. Context continuation is a CLI flag: every call passes
//! `--continue` unless the caller asks for a fresh context, in which case
//! the flag is omitted and the CLI starts a new conversation. The process
//! is opaque to us; success is exit code zero, the reply is stdout, and
//! everything else is a provider error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use ferry_config::ProviderConfig;
use ferry_core::{AiProvider, FerryError};

/// Runs the configured command with the message as the final argument.
pub struct CliProvider {
    program: String,
    base_args: Vec<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl CliProvider {
    /// Builds a provider from configuration. Fails if the configured
    /// command line is empty or not shell-parseable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, FerryError> {
        let parts = shell_words::split(&config.command).map_err(|e| FerryError::Provider {
            message: format!("unparseable provider command {:?}", config.command),
            source: Some(Box::new(e)),
        })?;
        let mut parts = parts.into_iter();
        let program = parts.next().ok_or_else(|| FerryError::Provider {
            message: "provider command is empty".to_string(),
            source: None,
        })?;
        Ok(Self {
            program,
            base_args: parts.collect(),
            model: config.model.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    fn build_args(&self, message: &str, fresh_context: bool) -> Vec<String> {
        let mut args = self.base_args.clone();
        if !fresh_context {
            args.push("--continue".to_string());
        }
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.push(message.to_string());
        args
    }

    async fn run(&self, args: &[String]) -> Result<String, FerryError> {
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FerryError::Provider {
                message: format!("failed to spawn provider command {:?}", self.program),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(code, stderr = %stderr.trim(), "provider exited with error");
            return Err(FerryError::Provider {
                message: format!("provider exited with code {code}"),
                source: None,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl AiProvider for CliProvider {
    async fn invoke(&self, message: &str, fresh_context: bool) -> Result<String, FerryError> {
        let args = self.build_args(message, fresh_context);
        debug!(
            program = self.program.as_str(),
            fresh_context,
            chars = message.len(),
            "invoking provider"
        );

        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, self.run(&args))
                .await
                .unwrap_or(Err(FerryError::Timeout { duration })),
            // Unbounded by default: replies may legitimately take minutes,
            // and the single worker simply waits.
            None => self.run(&args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_config::ProviderConfig;

    fn provider(command: &str) -> CliProvider {
        CliProvider::from_config(&ProviderConfig {
            command: command.to_string(),
            model: None,
            timeout_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn from_config_rejects_empty_command() {
        let result = CliProvider::from_config(&ProviderConfig {
            command: "   ".to_string(),
            model: None,
            timeout_secs: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn continued_context_adds_the_flag() {
        let p = provider("claude -p");
        let args = p.build_args("hi", false);
        assert_eq!(args, vec!["-p", "--continue", "hi"]);
    }

    #[test]
    fn fresh_context_omits_the_flag() {
        let p = provider("claude -p");
        let args = p.build_args("hi", true);
        assert_eq!(args, vec!["-p", "hi"]);
    }

    #[test]
    fn model_selector_is_forwarded() {
        let p = CliProvider::from_config(&ProviderConfig {
            command: "claude -p".to_string(),
            model: Some("opus".to_string()),
            timeout_secs: None,
        })
        .unwrap();
        let args = p.build_args("hi", true);
        assert_eq!(args, vec!["-p", "--model", "opus", "hi"]);
    }

    #[tokio::test]
    async fn echo_round_trip() {
        let p = provider("echo");
        // `echo --continue hi` would print the flag too, so use fresh.
        let reply = p.invoke("hello", true).await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_provider_error() {
        let p = provider("false");
        let err = p.invoke("hi", true).await.unwrap_err();
        assert!(err.is_provider_error());
    }

    #[tokio::test]
    async fn missing_binary_is_provider_error() {
        let p = provider("/nonexistent/ferry-test-binary");
        let err = p.invoke("hi", true).await.unwrap_err();
        assert!(err.is_provider_error());
    }

    #[tokio::test]
    async fn timeout_fires() {
        let p = CliProvider::from_config(&ProviderConfig {
            command: "sleep".to_string(),
            model: None,
            timeout_secs: Some(1),
        })
        .unwrap();
        // The message doubles as sleep's duration argument.
        let err = p.invoke("5", true).await.unwrap_err();
        assert!(matches!(err, FerryError::Timeout { .. }));
    }
}
