//! Pipeline configuration.
//!
//! All settings deserialize from one TOML document; sections other than
//! `[provider]` fall back to defaults when omitted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use magi_provider::{ProviderConfig, RetryPolicy};

/// Top-level configuration for the deliberation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagiConfig {
    /// Provider and model selection.
    pub provider: ProviderConfig,
    /// Retry behavior for model calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Question-type detector tuning.
    #[serde(default)]
    pub detector: DetectorConfig,
}

/// Serializable retry settings; converts into a [`RetryPolicy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per model call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_factor: 2,
        }
    }
}

impl RetryConfig {
    /// Converts into the policy the provider layer runs with.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
        }
    }
}

/// Question-type detector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Whether to send a token bias pinning the detector's single output
    /// token to `Yes`/`No`. Requires a provider that honors `logit_bias`.
    #[serde(default)]
    pub use_token_bias: bool,
}
