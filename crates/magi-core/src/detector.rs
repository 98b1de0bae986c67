//! Question-type detection.
//!
//! Decides whether a question is, by its linguistic form, a yes/no
//! question. The detector consults the model with a few-shot prompt and
//! a single-token completion; the pipeline's voter prompts branch on the
//! result.
//!
//! Detection fails open: any failure classifies the question as
//! open-ended and records why, so a flaky detector degrades answer
//! framing instead of blocking deliberation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use magi_provider::{ChatRequest, ModelCaller, RetryPolicy};

use crate::question::{Question, QuestionClassification};

/// Few-shot instructions for the single-token form classifier.
///
/// Classification is by linguistic form only: "Should I buy new shoes?"
/// is a yes/no question even though any actual answer needs context.
const DETECTOR_PROMPT: &str = "\
You classify questions by their linguistic form. Reply with exactly one \
word, Yes or No: Yes if the text is a question answerable with yes or no, \
No otherwise. Judge the form of the question, never whether you could \
answer it.

Examples:
Q: Is 3 < 2? A: Yes
Q: What time is it? A: No
Q: Should I buy new shoes? A: Yes
Q: What is the meaning of life? A: No
Q: 2+2=5 A: Yes
Q: Explain photosynthesis. A: No
Q: Can a triangle have two right angles? A: Yes
Q: Why is the sky blue? A: No";

/// Token ids for `Yes` and `No` in the cl100k-family vocabularies; used
/// as a bias to pin the single-token completion when the provider
/// accepts `logit_bias`.
const YES_TOKEN: u32 = 9642;
const NO_TOKEN: u32 = 2822;
const BIAS_STRENGTH: i32 = 100;

/// Classifies questions as yes/no or open-ended via a single-token
/// model completion.
pub struct QuestionTypeDetector {
    caller: Arc<dyn ModelCaller>,
    retry: RetryPolicy,
    use_token_bias: bool,
}

impl QuestionTypeDetector {
    /// Creates a detector over the given caller.
    pub fn new(caller: Arc<dyn ModelCaller>, retry: RetryPolicy, use_token_bias: bool) -> Self {
        Self {
            caller,
            retry,
            use_token_bias,
        }
    }

    /// Classifies one question. Never fails: caller errors produce an
    /// open-ended classification carrying the error text.
    pub async fn detect(&self, question: &Question) -> QuestionClassification {
        let result = self.retry.run(|| self.caller.call(self.request(question))).await;

        match result {
            Ok(reply) => {
                let token = reply.trim();
                let is_yes_or_no = match token {
                    "Yes" => true,
                    "No" => false,
                    other => {
                        warn!(
                            question_id = question.id.0,
                            token = other,
                            "unexpected detector token, treating question as open"
                        );
                        false
                    }
                };
                debug!(
                    question_id = question.id.0,
                    is_yes_or_no, "question type detected"
                );
                QuestionClassification {
                    question_id: question.id,
                    is_yes_or_no,
                    detection_error: None,
                }
            }
            Err(err) => {
                warn!(
                    question_id = question.id.0,
                    "question type detection failed: {err}"
                );
                QuestionClassification {
                    question_id: question.id,
                    is_yes_or_no: false,
                    detection_error: Some(err.to_string()),
                }
            }
        }
    }

    fn request(&self, question: &Question) -> ChatRequest {
        let mut request = ChatRequest::new(question.text.clone())
            .with_system(DETECTOR_PROMPT)
            .with_max_tokens(1)
            .with_temperature(0.0);
        if self.use_token_bias {
            let bias: HashMap<u32, i32> =
                HashMap::from([(YES_TOKEN, BIAS_STRENGTH), (NO_TOKEN, BIAS_STRENGTH)]);
            request = request.with_token_bias(bias);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use magi_provider::CallerError;

    use crate::question::QuestionId;

    struct FixedCaller {
        reply: Result<String, CallerError>,
    }

    #[async_trait]
    impl ModelCaller for FixedCaller {
        async fn call(&self, _request: ChatRequest) -> Result<String, CallerError> {
            self.reply.clone()
        }
    }

    fn detector(reply: Result<String, CallerError>) -> QuestionTypeDetector {
        QuestionTypeDetector::new(Arc::new(FixedCaller { reply }), RetryPolicy::none(), false)
    }

    fn question(text: &str) -> Question {
        Question {
            id: QuestionId(1),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_yes_token_marks_yes_or_no() {
        let classification = detector(Ok("Yes".to_string()))
            .detect(&question("Is water wet?"))
            .await;
        assert!(classification.is_yes_or_no);
        assert!(classification.detection_error.is_none());
    }

    #[tokio::test]
    async fn test_no_token_marks_open() {
        let classification = detector(Ok("No".to_string()))
            .detect(&question("What time is it?"))
            .await;
        assert!(!classification.is_yes_or_no);
        assert!(classification.detection_error.is_none());
    }

    #[tokio::test]
    async fn test_anomalous_token_falls_back_to_open() {
        let classification = detector(Ok("Maybe".to_string()))
            .detect(&question("Is water wet?"))
            .await;
        assert!(!classification.is_yes_or_no);
        // An anomalous token is a successful call, not a detection error.
        assert!(classification.detection_error.is_none());
    }

    #[tokio::test]
    async fn test_caller_failure_fails_open_with_error() {
        let classification = detector(Err(CallerError::Auth("bad key".to_string())))
            .detect(&question("Is water wet?"))
            .await;
        assert!(!classification.is_yes_or_no);
        let error = classification.detection_error.unwrap();
        assert!(error.contains("bad key"));
    }

    #[tokio::test]
    async fn test_detector_request_shape() {
        let detector = QuestionTypeDetector::new(
            Arc::new(FixedCaller {
                reply: Ok("Yes".to_string()),
            }),
            RetryPolicy::none(),
            true,
        );
        let request = detector.request(&question("Is 3 < 2?"));
        assert_eq!(request.max_tokens, Some(1));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.system.len(), 1);
        let bias = request.token_bias.unwrap();
        assert_eq!(bias.get(&YES_TOKEN), Some(&BIAS_STRENGTH));
        assert_eq!(bias.get(&NO_TOKEN), Some(&BIAS_STRENGTH));
    }

    #[tokio::test]
    async fn test_reply_with_surrounding_whitespace_is_trimmed() {
        let classification = detector(Ok(" Yes\n".to_string()))
            .detect(&question("Is water wet?"))
            .await;
        assert!(classification.is_yes_or_no);
    }
}
