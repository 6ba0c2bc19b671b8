// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Taskpulse - realtime fanout and notification daemon for a task manager.
//!
//! This is the binary entry point for the Taskpulse server.

use clap::{Parser, Subcommand};

mod directory;
mod ingest;
mod serve;
mod shutdown;

/// Taskpulse - realtime fanout and notification daemon.
#[derive(Parser, Debug)]
#[command(name = "taskpulse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Taskpulse server (default).
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match taskpulse_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            taskpulse_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("taskpulse: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("taskpulse: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Defaults alone must produce a valid config (no file needed).
        let config = taskpulse_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.app.name, "Taskpulse");
        assert_eq!(config.server.port, 4000);
    }
}
