//! The `snapmap ingest` command: upload, describe, persist.

use crate::store::{FsPhotoStore, JsonlPhotoRepository};
use clap::Args;
use snapmap_core::{ClientManager, Config, Describer, Ingestor, PhotoMetadata};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Image file to ingest
    #[arg(required = true)]
    pub image: PathBuf,

    /// Photo title
    #[arg(short, long)]
    pub title: String,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: f64,

    /// User the photo belongs to
    #[arg(long, default_value = "local")]
    pub user: String,
}

/// Execute the ingest command against the local collaborators.
///
/// Storage or persistence failure fails the command; a missing AI
/// description does not — the record is printed with `"description": null`.
pub async fn execute(args: IngestArgs, config: Config) -> anyhow::Result<()> {
    let image = super::read_image(&args.image)?;

    let store = Arc::new(FsPhotoStore::new(config.media_dir()));
    let repo = Arc::new(JsonlPhotoRepository::new(config.index_path()));
    let clients = Arc::new(ClientManager::from_config(&config.provider));
    let describer = Describer::from_config(clients, &config);
    let ingestor = Ingestor::new(store, repo, describer);

    let metadata = PhotoMetadata {
        title: args.title,
        latitude: args.latitude,
        longitude: args.longitude,
    };

    let record = ingestor.ingest(&image, metadata, &args.user).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
