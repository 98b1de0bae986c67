//! Classified caller errors.
//!
//! Tells the pipeline *why* a model call failed so it can pick the right
//! recovery strategy: transient failures are retried, everything else is
//! surfaced as an error verdict.

use thiserror::Error;

/// Errors produced by a [`crate::ModelCaller`] implementation.
#[derive(Debug, Clone, Error)]
pub enum CallerError {
    /// Connection refused, DNS failure, reset, TLS handshake failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request or the provider took too long.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// 401/403: bad API key or permissions.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// 429: rate limited; `retry_after` holds the server's hint in seconds.
    #[error("rate limited: {message}")]
    RateLimit {
        /// Provider-supplied detail.
        message: String,
        /// Seconds to wait before retrying, when the provider said so.
        retry_after: Option<u64>,
    },

    /// Any other non-success HTTP status from the provider.
    #[error("provider error (status {status}): {message}")]
    Provider {
        /// The HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// The provider returned 200 but the body was not a usable reply.
    #[error("malformed provider reply: {0}")]
    MalformedReply(String),

    /// The caller was constructed with an unusable configuration.
    #[error("invalid caller configuration: {0}")]
    Config(String),
}

impl CallerError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network faults, timeouts, rate limits and provider-side outages are
    /// transient. Auth and other client-side errors fail immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. } => true,
            Self::Provider { status, .. } => *status >= 500,
            Self::Auth(_) | Self::MalformedReply(_) | Self::Config(_) => false,
        }
    }

    /// Maps a non-success HTTP status onto an error kind.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = truncate_body(body);
        match status {
            401 | 403 => Self::Auth(message),
            408 => Self::Timeout(message),
            429 => Self::RateLimit {
                retry_after: extract_retry_after(body),
                message,
            },
            _ => Self::Provider { status, message },
        }
    }

    /// Maps a transport-level failure onto an error kind.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Pulls a `retry_after`-style hint out of a 429 response body.
fn extract_retry_after(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("retry_after"))
        .or_else(|| value.get("retry_after"))
        .and_then(|v| v.as_u64())
}

/// Keeps error messages log-friendly.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
