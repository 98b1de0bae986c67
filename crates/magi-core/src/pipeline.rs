//! The deliberation pipeline facade.
//!
//! [`Magi`] owns the session tracker, the type detector, the persona
//! triad, and the response classifier, and runs the full flow for one
//! question: detect, consult all three personas concurrently, classify
//! each reply, aggregate.
//!
//! Progress is reported on an event channel so a console can render
//! verdicts as they land. Every event carries the question id it belongs
//! to, and events for superseded questions are suppressed at the source.

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, info};

use magi_council::{
    aggregate, triad, DecisionState, PersonaProfile, PersonaVerdict, ResponseClassifier,
    VerdictStatus,
};
use magi_provider::{ChatRequest, ModelCaller, RetryPolicy};

use crate::config::MagiConfig;
use crate::detector::QuestionTypeDetector;
use crate::question::{
    Deliberation, FinalDecision, Question, QuestionClassification, QuestionId,
};
use crate::session::SessionTracker;

/// Sampling temperature for persona answers. The voters are meant to
/// disagree; the detector runs at zero separately.
const VOTER_TEMPERATURE: f32 = 0.7;

/// Progress notifications emitted while a question is deliberated.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The question type was detected.
    Classified {
        /// The question this event belongs to.
        question_id: QuestionId,
        /// Whether the question was classified as yes/no.
        is_yes_or_no: bool,
        /// Set when detection failed and the question fell back to open.
        detection_error: Option<String>,
    },
    /// One persona's verdict resolved.
    Verdict {
        /// The question this event belongs to.
        question_id: QuestionId,
        /// The resolved verdict.
        verdict: PersonaVerdict,
    },
    /// All three verdicts resolved and were aggregated.
    FinalDecision {
        /// The question this event belongs to.
        question_id: QuestionId,
        /// The aggregated status.
        status: VerdictStatus,
    },
}

struct Inner {
    session: SessionTracker,
    caller: Arc<dyn ModelCaller>,
    detector: QuestionTypeDetector,
    classifier: ResponseClassifier,
    profiles: [PersonaProfile; 3],
    retry: RetryPolicy,
    events: mpsc::UnboundedSender<PipelineEvent>,
    state: RwLock<DecisionState>,
}

/// Handle to the deliberation pipeline. Cheap to clone; all clones share
/// one session.
#[derive(Clone)]
pub struct Magi {
    inner: Arc<Inner>,
}

impl Magi {
    /// Builds a pipeline over the given caller and returns it together
    /// with the receiving end of its event channel.
    pub fn new(
        config: &MagiConfig,
        caller: Arc<dyn ModelCaller>,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let retry = config.retry.policy();
        let detector = QuestionTypeDetector::new(
            Arc::clone(&caller),
            retry.clone(),
            config.detector.use_token_bias,
        );

        let magi = Self {
            inner: Arc::new(Inner {
                session: SessionTracker::new(),
                caller,
                detector,
                classifier: ResponseClassifier::new(),
                profiles: triad(),
                retry,
                events,
                state: RwLock::new(DecisionState::Standby),
            }),
        };
        (magi, receiver)
    }

    /// Submits a question and returns its id immediately. The
    /// deliberation runs in the background; progress arrives on the
    /// event channel. Any in-flight question is superseded.
    pub fn submit(&self, text: impl Into<String>) -> QuestionId {
        let question = self.begin(text);
        let id = question.id;
        let magi = self.clone();
        tokio::spawn(async move {
            magi.deliberate(question).await;
        });
        id
    }

    /// Submits a question and waits for its full deliberation record.
    ///
    /// When a newer question superseded this one mid-flight, the record
    /// still carries the individual verdicts but no decision: stale
    /// verdicts are never aggregated, no events were emitted for them,
    /// and the shared state was left untouched.
    pub async fn ask(&self, text: impl Into<String>) -> Deliberation {
        let question = self.begin(text);
        self.deliberate(question).await
    }

    /// The current externally visible deliberation state.
    pub fn state(&self) -> DecisionState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The id of the most recently submitted question, if any.
    pub fn current_question(&self) -> Option<QuestionId> {
        self.inner.session.current()
    }

    /// Issues the id and marks the session deliberating under one write
    /// guard, so currency checks made under the same lock are
    /// authoritative.
    fn begin(&self, text: impl Into<String>) -> Question {
        let mut state = self.lock_write();
        let question = self.inner.session.issue(text);
        *state = DecisionState::Deliberating;
        info!(question_id = question.id.0, "question submitted");
        question
    }

    async fn deliberate(&self, question: Question) -> Deliberation {
        let classification = self.inner.detector.detect(&question).await;
        self.emit_if_current(
            question.id,
            PipelineEvent::Classified {
                question_id: question.id,
                is_yes_or_no: classification.is_yes_or_no,
                detection_error: classification.detection_error.clone(),
            },
        );

        let [melchior, balthasar, casper] = &self.inner.profiles;
        let verdicts = tokio::join!(
            self.consult(&question, &classification, melchior),
            self.consult(&question, &classification, balthasar),
            self.consult(&question, &classification, casper),
        );
        let verdicts = [verdicts.0, verdicts.1, verdicts.2];

        let decision = self.conclude(question.id, &verdicts);

        Deliberation {
            question,
            classification,
            verdicts,
            decision,
        }
    }

    /// Aggregates the verdicts and publishes the decision, unless the
    /// question was superseded.
    ///
    /// The currency check, the state write, and the event send happen
    /// under one write guard; `begin` takes the same guard, so a newer
    /// question can never slip in between the check and the write and a
    /// stale task can never overwrite the state or push a late event.
    fn conclude(
        &self,
        id: QuestionId,
        verdicts: &[PersonaVerdict; 3],
    ) -> Option<FinalDecision> {
        let mut state = self.lock_write();
        if !self.inner.session.is_current(id) {
            debug!(
                question_id = id.0,
                "deliberation finished for a superseded question, dropping"
            );
            return None;
        }

        let status = aggregate(verdicts);
        *state = DecisionState::Decided(status);
        let _ = self.inner.events.send(PipelineEvent::FinalDecision {
            question_id: id,
            status,
        });
        info!(question_id = id.0, %status, "deliberation complete");
        Some(FinalDecision {
            question_id: id,
            status,
        })
    }

    /// Runs one persona's consultation and classifies the reply.
    ///
    /// A detection failure short-circuits every voter to an error
    /// verdict; a caller failure fails only that voter.
    async fn consult(
        &self,
        question: &Question,
        classification: &QuestionClassification,
        profile: &PersonaProfile,
    ) -> PersonaVerdict {
        let verdict = if let Some(error) = &classification.detection_error {
            PersonaVerdict::failed(profile.persona, error.clone())
        } else {
            let request = ChatRequest::new(framed_question(question, classification))
                .with_system(profile.system_prompt.clone())
                .with_temperature(VOTER_TEMPERATURE);

            match self
                .inner
                .retry
                .run(|| self.inner.caller.call(request.clone()))
                .await
            {
                Ok(raw) => {
                    let (answer, classified) =
                        self.inner.classifier.parse(&raw, classification.is_yes_or_no);
                    PersonaVerdict::answered(profile.persona, answer, classified)
                }
                Err(err) => {
                    debug!(
                        question_id = question.id.0,
                        persona = %profile.persona,
                        "persona call failed: {err}"
                    );
                    PersonaVerdict::failed(profile.persona, err.to_string())
                }
            }
        };

        self.emit_if_current(
            question.id,
            PipelineEvent::Verdict {
                question_id: question.id,
                verdict: verdict.clone(),
            },
        );
        verdict
    }

    /// Sends the event unless `id` was superseded. The check and the
    /// send hold the state read guard, which excludes a concurrent
    /// `begin`, so a stale event can never land after supersession.
    ///
    /// A dropped receiver means nobody is watching; not an error.
    fn emit_if_current(&self, id: QuestionId, event: PipelineEvent) {
        let _guard = self
            .inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.inner.session.is_current(id) {
            let _ = self.inner.events.send(event);
        } else {
            debug!(question_id = id.0, "suppressing event for superseded question");
        }
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, DecisionState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Prefixes the question with the type statement the persona prompts
/// branch on.
fn framed_question(question: &Question, classification: &QuestionClassification) -> String {
    let frame = if classification.is_yes_or_no {
        "This is a yes/no question."
    } else {
        "This is an open question."
    };
    format!("{frame}\n\n{}", question.text)
}
