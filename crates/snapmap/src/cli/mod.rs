//! Command handlers for the Snapmap CLI.

pub mod config;
pub mod describe;
pub mod ingest;
pub mod stream;

use anyhow::Context;
use snapmap_core::ImagePayload;
use std::path::Path;

/// Read an image file into a payload, detecting the format from magic
/// bytes and falling back to the file extension.
pub(crate) fn read_image(path: &Path) -> anyhow::Result<ImagePayload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;

    let format = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Jpeg) => "jpeg",
        Ok(image::ImageFormat::Png) => "png",
        Ok(image::ImageFormat::WebP) => "webp",
        Ok(image::ImageFormat::Gif) => "gif",
        _ => path.extension().and_then(|e| e.to_str()).unwrap_or("jpeg"),
    };

    Ok(ImagePayload::from_bytes(bytes, format))
}
