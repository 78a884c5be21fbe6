//! Retry policy for transient provider failures.
//!
//! Provides classification of retryable errors and exponential backoff.
//! Only provider overload/unavailability is worth retrying; configuration
//! errors, auth failures, and bad requests are permanent.

use crate::config::RetryConfig;
use crate::error::AiError;
use std::time::Duration;

/// Determine whether a provider error is worth retrying.
///
/// Retryable: 503 responses and errors reporting an unavailable or
/// overloaded model. Everything else — including missing credentials —
/// is permanent; retrying cannot help.
pub fn is_retryable(error: &AiError) -> bool {
    match error {
        AiError::Config(_) => false,
        AiError::Provider {
            status_code,
            message,
        } => {
            if *status_code == Some(503) {
                return true;
            }
            let lowered = message.to_ascii_lowercase();
            message.contains("503")
                || lowered.contains("unavailable")
                || lowered.contains("overloaded")
        }
    }
}

/// Bounded exponential backoff policy for the synchronous description path.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
        }
    }

    /// Backoff after the given 1-indexed attempt: `base * 2^attempt`,
    /// capped at 30 seconds. Attempt 1 → 2s, attempt 2 → 4s with the
    /// default base.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(30_000))
    }
}
