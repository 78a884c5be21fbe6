//! Vision provider trait and request types.
//!
//! Defines the interface the description paths call through, so the retry
//! executor and stream adapter never depend on a concrete provider.

use crate::error::AiError;
use async_trait::async_trait;
use base64::Engine;
use futures_util::Stream;
use std::pin::Pin;

/// Fixed instructional prompt sent with every description request.
pub(crate) const DESCRIPTION_PROMPT: &str =
    "Analyze this photo and generate a concise, professional, and technical \
     description in one paragraph, suitable for an infrastructure inspection \
     report. Focus on key elements and conditions.";

/// Raw image bytes plus MIME type, owned by the caller for one request.
///
/// The core never persists the payload; base64 encoding happens at the
/// provider boundary when the wire request is built.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub mime_type: String,
}

impl ImagePayload {
    /// Create a payload from bytes and an already-known MIME type.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Create a payload from bytes and a format identifier ("jpeg", "png", ...).
    pub fn from_bytes(bytes: Vec<u8>, format: &str) -> Self {
        let mime_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            bytes,
            mime_type: mime_type.to_string(),
        }
    }

    /// Base64-encode the payload for inline submission.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Ordered sequence of text fragments from a streaming generation call.
///
/// Each item is one provider chunk's text (possibly empty); an `Err` item
/// terminates the sequence from the consumer's point of view.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

/// Trait the description paths call through.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn VisionProvider>` shared across in-flight requests).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Generate a complete description in one call.
    ///
    /// Returns the concatenated response text, which may be empty when the
    /// provider answered with a well-formed but textless response — that is
    /// not an error here; the retry executor decides what to do with it.
    async fn generate(&self, image: &ImagePayload) -> Result<String, AiError>;

    /// Generate a description as a stream of text fragments.
    ///
    /// The returned stream owns its connection; dropping it abandons the
    /// provider request.
    async fn generate_stream(&self, image: &ImagePayload) -> Result<ChunkStream, AiError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
