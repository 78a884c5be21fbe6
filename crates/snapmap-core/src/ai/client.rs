//! Shared provider client with guarded lazy initialization.
//!
//! One logical provider client exists per process. Construction is deferred
//! to the first request and guarded by a `OnceCell`, so concurrent first
//! callers race on the guard, not on a partially-built client: exactly one
//! factory call wins and every caller observes the same instance.

use super::gemini::GeminiProvider;
use super::provider::{resolve_env_var, VisionProvider};
use crate::config::ProviderConfig;
use crate::error::AiError;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Builds the provider on first use. Credential validation happens here so
/// a missing key surfaces as a fatal configuration error, not a retryable
/// request failure.
pub type ProviderFactory =
    Box<dyn Fn() -> Result<Arc<dyn VisionProvider>, AiError> + Send + Sync>;

/// Owns the lazily-created, process-wide provider client.
pub struct ClientManager {
    factory: ProviderFactory,
    client: OnceCell<Arc<dyn VisionProvider>>,
}

impl ClientManager {
    /// Manager that builds a Gemini provider from configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let config = config.clone();
        Self::with_factory(Box::new(move || {
            let api_key = resolve_env_var(&config.api_key).ok_or_else(|| {
                AiError::Config(
                    "Gemini API key not set. Set GEMINI_API_KEY env var.".to_string(),
                )
            })?;
            Ok(Arc::new(GeminiProvider::new(
                &api_key,
                &config.model,
                &config.endpoint,
            )) as Arc<dyn VisionProvider>)
        }))
    }

    /// Manager with an explicit provider factory.
    pub fn with_factory(factory: ProviderFactory) -> Self {
        Self {
            factory,
            client: OnceCell::new(),
        }
    }

    /// Get the shared client, constructing it on first call.
    ///
    /// A factory error is not cached: a later call retries construction.
    pub async fn get(&self) -> Result<Arc<dyn VisionProvider>, AiError> {
        self.client
            .get_or_try_init(|| {
                tracing::info!("Initializing AI provider client on first request");
                let result = (self.factory)();
                async move { result }
            })
            .await
            .cloned()
    }
}
