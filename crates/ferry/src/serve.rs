// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry serve` command implementation.
//!
//! Starts the queue processor and the webhook ingress against the shared
//! queue store. Platform adapters (Telegram, Discord, WhatsApp bridges)
//! are separate processes built on `ferry-channel`; they coordinate with
//! this one purely through the queue directories.

use std::sync::Arc;

use tracing::info;

use ferry_config::FerryConfig;
use ferry_core::FerryError;
use ferry_gateway::GatewayState;
use ferry_processor::SequentialProcessor;
use ferry_provider::CliProvider;
use ferry_queue::QueueStore;

use crate::shutdown;

/// Runs the `ferry serve` command until a shutdown signal arrives.
pub async fn run_serve(config: FerryConfig) -> Result<(), FerryError> {
    init_tracing(&config.agent.log_level);

    info!(
        name = config.agent.name.as_str(),
        queue = config.queue.root_dir.as_str(),
        "starting ferry serve"
    );

    let store = QueueStore::open(&config.queue.root_dir)?;
    let provider = Arc::new(CliProvider::from_config(&config.provider)?);

    let cancel = shutdown::install_signal_handler();

    let mut gateway_task = None;
    if config.gateway.enabled {
        let gateway_config = config.gateway.clone();
        let state = GatewayState::new(store.clone());
        let gateway_cancel = cancel.clone();
        gateway_task = Some(tokio::spawn(async move {
            ferry_gateway::serve(&gateway_config, state, gateway_cancel).await
        }));
        info!(
            host = config.gateway.host.as_str(),
            port = config.gateway.port,
            "webhook ingress enabled"
        );
    } else {
        info!("webhook ingress disabled by configuration");
    }

    // The processor runs on the main task; it owns the recovery sweep and
    // the one-in-flight invariant.
    let processor = SequentialProcessor::new(store, provider, &config.processor);
    processor.run(cancel.clone()).await;

    if let Some(task) = gateway_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                return Err(FerryError::Internal(format!(
                    "webhook task panicked: {e}"
                )));
            }
        }
    }

    info!("ferry serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ferry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
