//! The model caller contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CallerError;

/// One chat request: role prompts plus the user's text, with optional
/// sampling constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompts, sent in order before the user message.
    pub system: Vec<String>,
    /// The user message.
    pub user: String,
    /// Cap on generated tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Token-id → bias mapping for constrained single-token replies.
    /// Honored only by providers that accept `logit_bias`.
    pub token_bias: Option<HashMap<u32, i32>>,
}

impl ChatRequest {
    /// Creates a request with the given user text and no constraints.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: Vec::new(),
            user: user.into(),
            max_tokens: None,
            temperature: None,
            token_bias: None,
        }
    }

    /// Appends a system prompt.
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system.push(prompt.into());
        self
    }

    /// Caps the reply length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrains the reply toward the given tokens.
    pub fn with_token_bias(mut self, bias: HashMap<u32, i32>) -> Self {
        self.token_bias = Some(bias);
        self
    }
}

/// Executes one model request and returns the raw reply text.
///
/// The pipeline holds callers as `Arc<dyn ModelCaller>`; implementations
/// must be safe to share across the three concurrent persona calls.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Sends the request and returns the model's raw text reply.
    async fn call(&self, request: ChatRequest) -> Result<String, CallerError>;
}
