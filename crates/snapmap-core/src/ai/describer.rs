//! Best-effort synchronous description generation with bounded retries.
//!
//! The describer is the only caller-facing surface of the synchronous path
//! and it never fails: every provider outcome — transient errors, permanent
//! errors, exhausted retries, even a missing credential — degrades to
//! `None`, so AI stays advisory and can never block photo ingestion.

use super::client::ClientManager;
use super::provider::ImagePayload;
use super::retry::{is_retryable, RetryPolicy};
use crate::config::Config;
use crate::error::AiError;
use std::sync::Arc;
use std::time::Duration;

/// Synchronous description path with retry-on-transient-failure.
pub struct Describer {
    clients: Arc<ClientManager>,
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl Describer {
    pub fn new(clients: Arc<ClientManager>, policy: RetryPolicy, request_timeout: Duration) -> Self {
        Self {
            clients,
            policy,
            request_timeout,
        }
    }

    /// Describer sharing the given client manager, with policy and limits
    /// taken from configuration.
    pub fn from_config(clients: Arc<ClientManager>, config: &Config) -> Self {
        Self::new(
            clients,
            RetryPolicy::from_config(&config.retry),
            Duration::from_millis(config.limits.request_timeout_ms),
        )
    }

    /// Generate a complete description for the image.
    ///
    /// Returns `None` when no description could be produced. An empty
    /// provider response is retried exactly like a transient failure, up to
    /// the attempt limit; a permanent failure gives up immediately.
    pub async fn describe(&self, image: &ImagePayload) -> Option<String> {
        tracing::debug!(mime_type = %image.mime_type, "Starting sync description");

        for attempt in 1..=self.policy.max_attempts {
            tracing::debug!(attempt, max = self.policy.max_attempts, "Calling provider");

            match self.attempt(image).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                    tracing::warn!(attempt, "Provider returned no text content; retrying");
                }
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(attempt, error = %e, "Transient provider failure");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Permanent provider failure; skipping description");
                    return None;
                }
            }

            if attempt < self.policy.max_attempts {
                let delay = self.policy.backoff(attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            attempts = self.policy.max_attempts,
            "Description attempts exhausted; photo continues without AI annotation"
        );
        None
    }

    /// One provider call, bounded by the per-attempt timeout.
    async fn attempt(&self, image: &ImagePayload) -> Result<String, AiError> {
        let client = self.clients.get().await?;
        match tokio::time::timeout(self.request_timeout, client.generate(image)).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Provider {
                message: format!(
                    "request timed out after {}ms",
                    self.request_timeout.as_millis()
                ),
                status_code: None,
            }),
        }
    }
}
