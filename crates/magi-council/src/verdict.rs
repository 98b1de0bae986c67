//! Verdict types for persona responses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::persona::Persona;

/// Normalized status of a persona's answer (and of the final decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    /// Unconditional approval.
    Yes,
    /// Rejection.
    No,
    /// Approval contingent on stated conditions.
    Conditional,
    /// Informational answer; no yes/no judgment was made.
    Info,
    /// The call failed or nothing recoverable could be extracted.
    Error,
}

impl VerdictStatus {
    /// Parses a status keyword as emitted by the models (`"yes"`, `"no"`,
    /// `"conditional"`, `"info"`, `"error"`). Case-insensitive.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "conditional" => Some(Self::Conditional),
            "info" => Some(Self::Info),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
            Self::Conditional => write!(f, "CONDITIONAL"),
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Classification extracted from a model reply.
///
/// `conditions` is populated only when the status is [`VerdictStatus::Conditional`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The normalized status.
    pub status: VerdictStatus,
    /// Conditions attached to a conditional approval.
    pub conditions: Option<Vec<String>>,
}

impl Classification {
    /// A bare classification with no conditions.
    pub fn of(status: VerdictStatus) -> Self {
        Self {
            status,
            conditions: None,
        }
    }

    /// The neutral fallback used whenever nothing better can be extracted.
    pub fn info() -> Self {
        Self::of(VerdictStatus::Info)
    }
}

/// One persona's classified answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaVerdict {
    /// The persona that produced this verdict.
    pub persona: Persona,
    /// The normalized answer text, absent when the call failed outright.
    pub answer: Option<String>,
    /// The normalized status.
    pub status: VerdictStatus,
    /// Conditions, present only for conditional verdicts.
    pub conditions: Option<Vec<String>>,
    /// Human-readable failure description when `status` is `Error`.
    pub error: Option<String>,
}

impl PersonaVerdict {
    /// Builds a verdict from a successfully classified answer.
    pub fn answered(persona: Persona, answer: impl Into<String>, classification: Classification) -> Self {
        Self {
            persona,
            answer: Some(answer.into()),
            status: classification.status,
            conditions: classification.conditions,
            error: None,
        }
    }

    /// Builds an error verdict for a failed call.
    pub fn failed(persona: Persona, error: impl Into<String>) -> Self {
        Self {
            persona,
            answer: None,
            status: VerdictStatus::Error,
            conditions: None,
            error: Some(error.into()),
        }
    }
}
