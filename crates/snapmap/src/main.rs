//! Snapmap CLI - drives the photo-sharing backend core from the terminal.
//!
//! The backend's HTTP surface lives elsewhere; this binary exercises the
//! same core paths against local collaborators, which makes it the tool of
//! choice for development and provider debugging.
//!
//! # Usage
//!
//! ```bash
//! # One-shot description (the ingestion path's AI call)
//! snapmap describe photo.jpg
//!
//! # Live token-by-token description
//! snapmap stream photo.jpg
//!
//! # Full pipeline: store, describe, persist
//! snapmap ingest photo.jpg --title "Pump house" --latitude 52.52 --longitude 13.405
//!
//! # View configuration
//! snapmap config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod store;

/// Snapmap - photo ingestion and AI description, from the terminal.
#[derive(Parser, Debug)]
#[command(name = "snapmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a complete description for an image (best-effort, retried)
    Describe(cli::describe::DescribeArgs),

    /// Stream a description fragment by fragment as the provider emits it
    Stream(cli::stream::StreamArgs),

    /// Run the full pipeline: upload, describe, persist
    Ingest(cli::ingest::IngestArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match snapmap_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `snapmap config path`."
            );
            snapmap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Snapmap v{}", snapmap_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Describe(args) => cli::describe::execute(args, config).await,
        Commands::Stream(args) => cli::stream::execute(args, config).await,
        Commands::Ingest(args) => cli::ingest::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
