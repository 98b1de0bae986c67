//! # MAGI Council
//!
//! The three-persona deliberation core of the MAGI decision system.
//!
//! ## Overview
//!
//! A question put to the MAGI system is answered by three fixed personas,
//! each queried independently. Their raw replies are normalized by the
//! [`ResponseClassifier`] into [`PersonaVerdict`]s, and the three verdicts
//! are folded into a single [`VerdictStatus`] by the aggregation cascade.
//!
//! ## Components
//!
//! - **Personas** ([`persona`]): the fixed, ordered triad of role
//!   configurations (Melchior, Balthasar, Casper), each carrying its own
//!   system prompt from construction time onward.
//! - **Response Classifier** ([`classifier`]): extracts a normalized answer
//!   and classification from free-text or JSON model output, with tiered
//!   recovery from malformed replies. Total over all string inputs.
//! - **Verdict Aggregator** ([`aggregator`]): combines exactly three
//!   verdicts into one final status under a deterministic veto cascade.
//!
//! Everything in this crate is pure logic: no I/O, no suspension points.
//! Model calls live in `magi-provider`; orchestration lives in `magi-core`.

pub mod aggregator;
pub mod classifier;
pub mod persona;
pub mod verdict;

pub use aggregator::{aggregate, DecisionState};
pub use classifier::ResponseClassifier;
pub use persona::{triad, Persona, PersonaProfile};
pub use verdict::{Classification, PersonaVerdict, VerdictStatus};
