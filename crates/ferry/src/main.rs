// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ferry - a durable queue-based message router for AI chat channels.
//!
//! This is the binary entry point for the Ferry router.

use clap::{Parser, Subcommand};

mod reset;
mod serve;
mod shutdown;
mod status;

/// Ferry - a durable queue-based message router for AI chat channels.
#[derive(Parser, Debug)]
#[command(name = "ferry", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the router: processor, webhook ingress, and queue recovery.
    Serve,
    /// Show queue depths and router state.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Request a conversation context reset for the next message.
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ferry_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            ferry_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json),
        Some(Commands::Reset) => reset::run_reset(&config),
    };

    if let Err(e) = result {
        eprintln!("ferry: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config =
            ferry_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "ferry");
    }
}
