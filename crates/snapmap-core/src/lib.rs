//! Snapmap Core - AI description and ingestion library for a photo-sharing
//! backend.
//!
//! The core covers the path from an uploaded image to a persisted photo
//! record: object storage upload (behind a trait seam), a best-effort
//! AI-generated description, and metadata persistence (behind a trait
//! seam). A second, independent path streams a description token by token
//! for live display.
//!
//! # Architecture
//!
//! ```text
//! ImagePayload → PhotoStore::upload → Describer (retry + backoff) → PhotoRepository::save
//! ImagePayload → StreamAdapter → StreamEvent sequence → push-protocol bridge
//! ```
//!
//! Both paths share one lazily-initialized provider client owned by
//! [`ClientManager`]. AI failure is never fatal to ingestion: the describer
//! degrades to `None` and the record is written without a description.
//!
//! # Usage
//!
//! ```rust,ignore
//! use snapmap_core::{ClientManager, Config, Describer, ImagePayload};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load().unwrap();
//!     let clients = Arc::new(ClientManager::from_config(&config.provider));
//!     let describer = Describer::from_config(clients, &config);
//!
//!     let image = ImagePayload::from_bytes(std::fs::read("photo.jpg").unwrap(), "jpeg");
//!     match describer.describe(&image).await {
//!         Some(text) => println!("{text}"),
//!         None => println!("no description available"),
//!     }
//! }
//! ```

// Module declarations
pub mod ai;
pub mod config;
pub mod error;
pub mod ingest;

// Re-exports for convenient access
pub use ai::{
    ClientManager, Describer, DescriptionStream, ImagePayload, StreamAdapter, StreamEvent,
    VisionProvider,
};
pub use config::Config;
pub use error::{AiError, ConfigError, IngestError, Result, SnapmapError};
pub use ingest::{Ingestor, NewPhoto, PhotoMetadata, PhotoRecord, PhotoRepository, PhotoStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
