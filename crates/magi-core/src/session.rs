//! Question identity issuance and staleness checks.
//!
//! The tracker is the single source of truth for which question is
//! current. Ids are issued strictly monotonically; any id below the
//! latest is stale and its results must be dropped without comment.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::question::{Question, QuestionId};

/// Issues question ids and answers "is this id still current?".
///
/// Lock-free; `issue` and `is_current` may be called from any task.
#[derive(Debug, Default)]
pub struct SessionTracker {
    latest: AtomicU64,
}

impl SessionTracker {
    /// Creates a tracker with no question issued yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `text` with a fresh id, superseding all earlier questions.
    pub fn issue(&self, text: impl Into<String>) -> Question {
        let id = QuestionId(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        Question {
            id,
            text: text.into(),
        }
    }

    /// Whether `id` is the most recently issued question.
    pub fn is_current(&self, id: QuestionId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.0
    }

    /// The most recently issued id, if any question has been issued.
    pub fn current(&self) -> Option<QuestionId> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(QuestionId(n)),
        }
    }
}
