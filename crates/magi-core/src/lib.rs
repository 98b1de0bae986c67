//! # MAGI Core
//!
//! Deliberation pipeline for the MAGI triad decision system.
//!
//! ## Control flow
//!
//! ```text
//!                  ┌──────────────────┐
//!   question ───▶  │ Session Tracker  │  stamps a fresh id; older ids
//!                  └────────┬─────────┘  become stale immediately
//!                           ▼
//!                  ┌──────────────────┐
//!                  │  Type Detector   │  yes/no or open (fail-open)
//!                  └────────┬─────────┘
//!            ┌──────────────┼──────────────┐
//!            ▼              ▼              ▼
//!      ┌──────────┐   ┌───────────┐   ┌──────────┐
//!      │ MELCHIOR │   │ BALTHASAR │   │  CASPER  │   three concurrent
//!      └────┬─────┘   └─────┬─────┘   └────┬─────┘   model calls
//!            ▼              ▼              ▼
//!                  ┌──────────────────┐
//!                  │    Classifier    │  per-reply normalization
//!                  └────────┬─────────┘
//!                           ▼
//!                  ┌──────────────────┐
//!                  │    Aggregator    │  one final status
//!                  └──────────────────┘
//! ```
//!
//! Verdicts tagged with a superseded question id are dropped silently:
//! they are never displayed, aggregated, or surfaced as errors.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use magi_core::{Magi, MagiConfig};
//! use magi_provider::OpenAiCaller;
//! use std::sync::Arc;
//!
//! let caller = Arc::new(OpenAiCaller::new(config.provider.clone())?);
//! let (magi, mut events) = Magi::new(&config, caller);
//!
//! let deliberation = magi.ask("Should we activate the unit?").await;
//! if let Some(decision) = deliberation.decision {
//!     println!("final: {}", decision.status);
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod question;
pub mod session;

pub use config::{DetectorConfig, MagiConfig, RetryConfig};
pub use detector::QuestionTypeDetector;
pub use error::MagiError;
pub use pipeline::{Magi, PipelineEvent};
pub use question::{Deliberation, FinalDecision, Question, QuestionClassification, QuestionId};
pub use session::SessionTracker;

// Re-export the council types that appear in this crate's public API.
pub use magi_council::{DecisionState, Persona, PersonaVerdict, VerdictStatus};

/// Core result type.
pub type Result<T> = std::result::Result<T, MagiError>;
