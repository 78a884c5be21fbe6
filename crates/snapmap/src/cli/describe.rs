//! The `snapmap describe` command: one-shot description generation.

use clap::Args;
use snapmap_core::{ClientManager, Config, Describer};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `describe` command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Image file to describe
    #[arg(required = true)]
    pub image: PathBuf,
}

/// Execute the describe command.
///
/// Mirrors the ingestion path's AI call: retries transient failures, and a
/// final failure is not an error — the command reports the absence and
/// exits successfully, exactly as ingestion would proceed without a
/// description.
pub async fn execute(args: DescribeArgs, config: Config) -> anyhow::Result<()> {
    let image = super::read_image(&args.image)?;

    let clients = Arc::new(ClientManager::from_config(&config.provider));
    let describer = Describer::from_config(clients, &config);

    match describer.describe(&image).await {
        Some(text) => println!("{text}"),
        None => println!("No description available."),
    }

    Ok(())
}
