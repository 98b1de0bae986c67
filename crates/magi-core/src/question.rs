//! Question identity and the records derived from one deliberation.

use serde::{Deserialize, Serialize};
use std::fmt;

use magi_council::{PersonaVerdict, VerdictStatus};

/// Monotonically increasing per-session question identifier.
///
/// Verdicts are matched to questions solely by this id, never by arrival
/// order: the three persona calls run concurrently with independent
/// latencies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A submitted question. Immutable once created; superseded, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Session-unique identifier.
    pub id: QuestionId,
    /// The user's text.
    pub text: String,
}

/// Result of question-type detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionClassification {
    /// The question this classification belongs to.
    pub question_id: QuestionId,
    /// Whether the question is, linguistically, a yes/no question.
    pub is_yes_or_no: bool,
    /// Set when detection itself failed; the question is then treated
    /// as open-ended and the voters short-circuit to error verdicts.
    pub detection_error: Option<String>,
}

/// The aggregated decision for one complete verdict triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDecision {
    /// The question this decision answers.
    pub question_id: QuestionId,
    /// The aggregated status.
    pub status: VerdictStatus,
}

/// Complete record of one question's deliberation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliberation {
    /// The question as submitted.
    pub question: Question,
    /// The detected question type.
    pub classification: QuestionClassification,
    /// The three persona verdicts, in canonical persona order.
    pub verdicts: [PersonaVerdict; 3],
    /// The aggregated decision. `None` when the question was superseded
    /// mid-flight: stale verdicts are never aggregated.
    pub decision: Option<FinalDecision>,
}
