// crates/divvy-cli/src/main.rs
//
// CLI entrypoint for the Divvy dividend ledger developer tools.
//
// Loads configuration, initializes tracing, and dispatches to the replay and
// config subcommands.

mod commands;
mod config;
mod error;
mod output;
mod script;
mod shared;

use clap::{Parser, Subcommand};
use config::CliConfig;
use output::OutputFormat;

/// Divvy CLI: replay dividend deposits and share movements.
#[derive(Parser, Debug)]
#[command(
    name = "divvy",
    version = "0.1.0",
    about = "Divvy CLI: pro-rata dividend accounting over transferable shares"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "divvy.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a script of deposits, mints, burns, transfers, and withdrawals.
    Replay {
        /// Path to the TOML replay script.
        #[arg(long)]
        script: String,

        /// Output format.
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Halt at the first rejected operation and exit with an error.
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration first so its log level can seed the filter.
    let loaded = CliConfig::load(&cli.config).map_err(|e| e.to_string());
    let config = loaded.clone().unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let source = match &loaded {
        Ok(_) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            Some(cli.config.as_str())
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                cli.config,
                e
            );
            None
        }
    };

    match &cli.command {
        Commands::Replay {
            script,
            format,
            stop_on_error,
        } => commands::replay::run(&config, script, *format, *stop_on_error).await?,
        Commands::Config => commands::config::run(&config, source).await?,
    }

    Ok(())
}
