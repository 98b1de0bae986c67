//! Verdict aggregation for the persona triad.
//!
//! Exactly three verdicts go in; one status comes out. The cascade is
//! deterministic and order-independent: any error poisons the decision,
//! any single "no" vetoes it, any reservation downgrades it to
//! conditional, and only unanimous approval yields "yes".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::verdict::{PersonaVerdict, VerdictStatus};

/// Combines the three persona verdicts into the final status.
///
/// Priority cascade, first match wins:
///
/// 1. any `Error` → `Error`
/// 2. any `No` → `No`
/// 3. any `Conditional` → `Conditional`
/// 4. all `Yes` → `Yes`
/// 5. otherwise → `Info`
///
/// The fixed-size array makes a partial or oversized verdict set
/// unrepresentable; callers gate on completeness before aggregating.
pub fn aggregate(verdicts: &[PersonaVerdict; 3]) -> VerdictStatus {
    let statuses = [verdicts[0].status, verdicts[1].status, verdicts[2].status];

    if statuses.contains(&VerdictStatus::Error) {
        VerdictStatus::Error
    } else if statuses.contains(&VerdictStatus::No) {
        VerdictStatus::No
    } else if statuses.contains(&VerdictStatus::Conditional) {
        VerdictStatus::Conditional
    } else if statuses.iter().all(|s| *s == VerdictStatus::Yes) {
        VerdictStatus::Yes
    } else {
        VerdictStatus::Info
    }
}

/// Externally visible deliberation state.
///
/// Until all three verdicts for the current question have resolved, the
/// observable status is an in-progress marker, never one of the final
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionState {
    /// No question has been submitted yet.
    Standby,
    /// A question is being deliberated; verdicts are still outstanding.
    Deliberating,
    /// All three verdicts resolved and were aggregated.
    Decided(VerdictStatus),
}

impl fmt::Display for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standby => write!(f, "STANDBY"),
            Self::Deliberating => write!(f, "DELIBERATING"),
            Self::Decided(status) => write!(f, "{}", status),
        }
    }
}
