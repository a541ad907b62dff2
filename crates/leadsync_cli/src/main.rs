//! leadsync CLI
//!
//! Command-line entry points for the two-way lead/task sync.
//!
//! # Commands
//!
//! - `sync-once` - Run a single reconciliation cycle and exit
//! - `poll` - Run cycles on the configured interval, forever
//! - `serve` - Expose the health/trigger HTTP endpoints
//! - `validate` - Exercise one read call against each external system

mod commands;

use clap::{Parser, Subcommand};
use leadsync_engine::SyncConfig;
use tracing_subscriber::EnvFilter;

/// Two-way sync between a lead store and a task board.
#[derive(Parser)]
#[command(name = "leadsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single reconciliation cycle and exit
    SyncOnce,

    /// Run reconciliation cycles on the poll interval, forever
    Poll,

    /// Serve the health/trigger HTTP endpoints
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },

    /// Check connectivity to both external systems and exit
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Fail fast on missing credentials, before anything touches the
    // network.
    let config = SyncConfig::from_env()?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::SyncOnce => commands::sync::run_once(&config),
        Commands::Poll => commands::sync::run_poll(&config),
        Commands::Serve { host, port } => commands::serve::run(&config, &host, port),
        Commands::Validate => commands::validate::run(&config),
    }
}
