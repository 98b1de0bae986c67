//! End-to-end pipeline tests over a scripted model caller.
//!
//! The caller routes by request shape: the detector is the only caller
//! of single-token completions, and persona requests are told apart by
//! the role prompt they carry. No network involved.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::Notify;

use magi_core::{
    DecisionState, Deliberation, Magi, MagiConfig, Persona, PipelineEvent, VerdictStatus,
};
use magi_provider::{
    CallerError, ChatRequest, ModelCaller, ProviderConfig, ProviderKind,
};

type Reply = Result<String, CallerError>;

/// Scripted caller with one fixed reply per request kind.
struct ScriptedCaller {
    detector: Reply,
    melchior: Reply,
    balthasar: Reply,
    casper: Reply,
    persona_calls: AtomicU32,
}

impl ScriptedCaller {
    fn new(detector: Reply, melchior: Reply, balthasar: Reply, casper: Reply) -> Arc<Self> {
        Arc::new(Self {
            detector,
            melchior,
            balthasar,
            casper,
            persona_calls: AtomicU32::new(0),
        })
    }

    /// All four scripts answer a yes/no question with the given statuses.
    fn voting(detector: &str, statuses: [&str; 3]) -> Arc<Self> {
        Self::new(
            Ok(detector.to_string()),
            Ok(vote_json(statuses[0])),
            Ok(vote_json(statuses[1])),
            Ok(vote_json(statuses[2])),
        )
    }
}

#[async_trait]
impl ModelCaller for ScriptedCaller {
    async fn call(&self, request: ChatRequest) -> Result<String, CallerError> {
        if request.max_tokens == Some(1) {
            return self.detector.clone();
        }
        self.persona_calls.fetch_add(1, Ordering::SeqCst);
        let role = request.system.first().map(String::as_str).unwrap_or("");
        if role.contains("Melchior-1") {
            self.melchior.clone()
        } else if role.contains("Balthasar-2") {
            self.balthasar.clone()
        } else if role.contains("Casper-3") {
            self.casper.clone()
        } else {
            Err(CallerError::MalformedReply("unknown role prompt".to_string()))
        }
    }
}

/// Wraps a caller and parks its first request until released, so a test
/// can hold one question in flight while another supersedes it.
struct GatedCaller {
    inner: Arc<ScriptedCaller>,
    gate: Arc<Notify>,
    calls: AtomicU32,
}

#[async_trait]
impl ModelCaller for GatedCaller {
    async fn call(&self, request: ChatRequest) -> Result<String, CallerError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        self.inner.call(request).await
    }
}

fn vote_json(status: &str) -> String {
    format!(
        r#"{{"answer": "In-character reasoning.", "classification": {{"status": "{status}"}}}}"#
    )
}

/// The decision status of a record that must carry one.
fn decision_status(deliberation: &Deliberation) -> VerdictStatus {
    deliberation
        .decision
        .as_ref()
        .expect("current question must carry a decision")
        .status
}

fn config() -> MagiConfig {
    let mut config = MagiConfig {
        provider: ProviderConfig::new(ProviderKind::OpenRouter, "test/model", "sk-test"),
        retry: Default::default(),
        detector: Default::default(),
    };
    // Tests script exact failures; retries would just repeat them.
    config.retry.max_attempts = 1;
    config
}

#[tokio::test]
async fn test_unanimous_yes_end_to_end() {
    let caller = ScriptedCaller::voting("Yes", ["yes", "yes", "yes"]);
    let (magi, mut events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Is the operation feasible?").await;

    assert!(deliberation.classification.is_yes_or_no);
    assert_eq!(decision_status(&deliberation), VerdictStatus::Yes);
    assert_eq!(magi.state(), DecisionState::Decided(VerdictStatus::Yes));

    // Verdicts come back in canonical persona order.
    let personas: Vec<Persona> = deliberation.verdicts.iter().map(|v| v.persona).collect();
    assert_eq!(personas, Persona::ALL.to_vec());

    // Classified first, one verdict per persona, final decision last.
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(received.len(), 5);
    assert!(matches!(
        received.first(),
        Some(PipelineEvent::Classified { is_yes_or_no: true, .. })
    ));
    assert!(matches!(
        received.last(),
        Some(PipelineEvent::FinalDecision { status: VerdictStatus::Yes, .. })
    ));
    let verdict_count = received
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Verdict { .. }))
        .count();
    assert_eq!(verdict_count, 3);
}

#[tokio::test]
async fn test_single_no_vetoes_final_decision() {
    let caller = ScriptedCaller::voting("Yes", ["yes", "yes", "no"]);
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Should we proceed?").await;

    assert_eq!(decision_status(&deliberation), VerdictStatus::No);
    assert_eq!(deliberation.verdicts[2].persona, Persona::Casper);
    assert_eq!(deliberation.verdicts[2].status, VerdictStatus::No);
}

#[tokio::test]
async fn test_conditional_approval_carries_conditions() {
    let conditional = r#"{
        "answer": "Only with safeguards.",
        "classification": {
            "status": "conditional",
            "conditions": ["pilot consent"]
        }
    }"#;
    let caller = ScriptedCaller::new(
        Ok("Yes".to_string()),
        Ok(vote_json("yes")),
        Ok(conditional.to_string()),
        Ok(vote_json("yes")),
    );
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Should we proceed?").await;

    assert_eq!(decision_status(&deliberation), VerdictStatus::Conditional);
    assert_eq!(
        deliberation.verdicts[1].conditions,
        Some(vec!["pilot consent".to_string()])
    );
}

#[tokio::test]
async fn test_voter_failure_poisons_decision_but_not_other_verdicts() {
    let caller = ScriptedCaller::new(
        Ok("Yes".to_string()),
        Ok(vote_json("yes")),
        Err(CallerError::Network("connection reset".to_string())),
        Ok(vote_json("yes")),
    );
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Should we proceed?").await;

    assert_eq!(decision_status(&deliberation), VerdictStatus::Error);
    assert_eq!(deliberation.verdicts[0].status, VerdictStatus::Yes);
    assert_eq!(deliberation.verdicts[1].status, VerdictStatus::Error);
    assert!(deliberation.verdicts[1]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("connection reset")));
    assert_eq!(deliberation.verdicts[2].status, VerdictStatus::Yes);
}

#[tokio::test]
async fn test_detector_failure_short_circuits_all_voters() {
    let caller = ScriptedCaller::new(
        Err(CallerError::Auth("bad key".to_string())),
        Ok(vote_json("yes")),
        Ok(vote_json("yes")),
        Ok(vote_json("yes")),
    );
    let caller_handle = Arc::clone(&caller);
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Should we proceed?").await;

    assert!(!deliberation.classification.is_yes_or_no);
    assert!(deliberation.classification.detection_error.is_some());
    assert_eq!(decision_status(&deliberation), VerdictStatus::Error);
    for verdict in &deliberation.verdicts {
        assert_eq!(verdict.status, VerdictStatus::Error);
    }
    // No persona was consulted.
    assert_eq!(caller_handle.persona_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_anomalous_detector_token_treats_question_as_open() {
    let caller = ScriptedCaller::new(
        Ok("Maybe".to_string()),
        Ok("Prose analysis.".to_string()),
        Ok("More prose.".to_string()),
        Ok("Even more prose.".to_string()),
    );
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Thoughts on the plan?").await;

    assert!(!deliberation.classification.is_yes_or_no);
    // An anomalous token is not a detection error; voters still run.
    assert!(deliberation.classification.detection_error.is_none());
    for verdict in &deliberation.verdicts {
        assert_eq!(verdict.status, VerdictStatus::Info);
    }
    assert_eq!(decision_status(&deliberation), VerdictStatus::Info);
}

#[tokio::test]
async fn test_open_question_answers_pass_through_unjudged() {
    let caller = ScriptedCaller::new(
        Ok("No".to_string()),
        Ok("  The data indicates a stable orbit. \n".to_string()),
        Ok(vote_json("yes")),
        Ok("Prose.".to_string()),
    );
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Describe the orbit.").await;

    assert_eq!(
        deliberation.verdicts[0].answer.as_deref(),
        Some("The data indicates a stable orbit.")
    );
    // JSON in an open answer is treated as text, never parsed.
    assert_eq!(deliberation.verdicts[1].status, VerdictStatus::Info);
    assert_eq!(decision_status(&deliberation), VerdictStatus::Info);
}

#[tokio::test]
async fn test_malformed_voter_output_recovers_by_tier() {
    let fenced = "```json\n{\"answer\":\"A\",\"classification\":{\"status\":\"yes\"}}\n```";
    let truncated = r#"{"answer": "partial thought..."#;
    let caller = ScriptedCaller::new(
        Ok("Yes".to_string()),
        Ok(fenced.to_string()),
        Ok(truncated.to_string()),
        Ok(vote_json("yes")),
    );
    let (magi, _events) = Magi::new(&config(), caller);

    let deliberation = magi.ask("Should we proceed?").await;

    assert_eq!(deliberation.verdicts[0].status, VerdictStatus::Yes);
    assert_eq!(deliberation.verdicts[1].answer.as_deref(), Some("partial thought"));
    assert_eq!(deliberation.verdicts[1].status, VerdictStatus::Info);
    // The truncated reply broke unanimity.
    assert_eq!(decision_status(&deliberation), VerdictStatus::Info);
}

#[tokio::test]
async fn test_superseded_question_emits_no_events() {
    let caller = ScriptedCaller::voting("Yes", ["yes", "yes", "yes"]);
    let (magi, mut events) = Magi::new(&config(), caller);

    let first = magi.submit("First question?");
    let second = magi.submit("Second question?");
    assert!(first < second);

    // Wait for the second question's decision.
    let mut decided = false;
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::FinalDecision { question_id, status } => {
                assert_eq!(question_id, second);
                assert_eq!(status, VerdictStatus::Yes);
                decided = true;
                break;
            }
            other => {
                let id = match other {
                    PipelineEvent::Classified { question_id, .. } => question_id,
                    PipelineEvent::Verdict { question_id, .. } => question_id,
                    PipelineEvent::FinalDecision { question_id, .. } => question_id,
                };
                assert_eq!(id, second, "event leaked from a superseded question");
            }
        }
    }
    assert!(decided);

    // Let the first question's task finish; it must stay silent.
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    assert_eq!(magi.state(), DecisionState::Decided(VerdictStatus::Yes));
    assert_eq!(magi.current_question(), Some(second));
}

#[tokio::test]
async fn test_superseded_ask_keeps_verdicts_but_derives_no_decision() {
    let gate = Arc::new(Notify::new());
    let caller = Arc::new(GatedCaller {
        inner: ScriptedCaller::voting("Yes", ["yes", "yes", "yes"]),
        gate: Arc::clone(&gate),
        calls: AtomicU32::new(0),
    });
    let (magi, _events) = Magi::new(&config(), caller);

    // Park the first question inside the detector call.
    let asker = magi.clone();
    let parked = tokio::spawn(async move { asker.ask("First?").await });
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    let second = magi.submit("Second?");
    gate.notify_one();
    let stale = parked.await.unwrap();

    // The stale record keeps its verdicts but no decision was derived
    // from them.
    assert!(stale.question.id < second);
    assert!(stale.decision.is_none());
    for verdict in &stale.verdicts {
        assert_eq!(verdict.status, VerdictStatus::Yes);
    }
}

#[tokio::test]
async fn test_late_finisher_cannot_overwrite_newer_state() {
    let gate = Arc::new(Notify::new());
    let caller = Arc::new(GatedCaller {
        inner: ScriptedCaller::voting("Yes", ["yes", "yes", "no"]),
        gate: Arc::clone(&gate),
        calls: AtomicU32::new(0),
    });
    let (magi, mut events) = Magi::new(&config(), caller);

    let asker = magi.clone();
    let parked = tokio::spawn(async move { asker.ask("First?").await });
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    // The second question runs to completion while the first is parked.
    let second = magi.submit("Second?");
    while let Some(event) = events.recv().await {
        if let PipelineEvent::FinalDecision { question_id, status } = event {
            assert_eq!(question_id, second);
            assert_eq!(status, VerdictStatus::No);
            break;
        }
    }
    assert_eq!(magi.state(), DecisionState::Decided(VerdictStatus::No));

    // Releasing the first question must not disturb the decided state
    // or push late events.
    gate.notify_one();
    let stale = parked.await.unwrap();
    assert!(stale.decision.is_none());
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(magi.state(), DecisionState::Decided(VerdictStatus::No));
    assert_eq!(magi.current_question(), Some(second));
}

#[tokio::test]
async fn test_state_transitions() {
    let caller = ScriptedCaller::voting("Yes", ["yes", "yes", "no"]);
    let (magi, _events) = Magi::new(&config(), caller);

    assert_eq!(magi.state(), DecisionState::Standby);
    assert_eq!(magi.current_question(), None);

    let deliberation = magi.ask("Should we proceed?").await;

    assert_eq!(magi.state(), DecisionState::Decided(VerdictStatus::No));
    assert_eq!(magi.current_question(), Some(deliberation.question.id));
}
