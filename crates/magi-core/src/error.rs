//! Core error type.

use magi_provider::CallerError;
use thiserror::Error;

/// Errors surfaced by the deliberation pipeline.
///
/// Note that per-voter model failures are not errors at this level: they
/// become error verdicts and flow through aggregation like any other
/// status. This type covers failures to run the pipeline at all.
#[derive(Debug, Error)]
pub enum MagiError {
    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A model caller could not be constructed or used.
    #[error("caller error: {0}")]
    Caller(#[from] CallerError),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}
