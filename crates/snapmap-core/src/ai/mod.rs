//! AI description generation for uploaded photos.
//!
//! Two consumption paths share one lazily-initialized provider client: a
//! best-effort synchronous path with bounded retries (used during photo
//! ingestion) and a streaming path that republishes provider chunks as an
//! ordered event sequence for a push-protocol bridge.

pub(crate) mod client;
pub(crate) mod describer;
pub(crate) mod gemini;
pub(crate) mod provider;
pub(crate) mod retry;
pub(crate) mod stream;

pub use client::{ClientManager, ProviderFactory};
pub use describer::Describer;
pub use provider::{resolve_env_var, ChunkStream, ImagePayload, VisionProvider};
pub use retry::{is_retryable, RetryPolicy};
pub use stream::{DescriptionStream, StreamAdapter, StreamEvent};
