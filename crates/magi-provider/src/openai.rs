//! Caller for OpenAI-compatible chat-completions endpoints.
//!
//! Covers every provider in [`crate::ProviderKind`]: they all speak the
//! same `POST /chat/completions` dialect with bearer authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::caller::{ChatRequest, ModelCaller};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::CallerError;

/// HTTP caller for chat-completions-compatible providers.
pub struct OpenAiCaller {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiCaller {
    /// Builds a caller from the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, CallerError> {
        if config.api_key.is_empty() {
            return Err(CallerError::Config("api_key is empty".to_string()));
        }
        if config.kind == ProviderKind::Custom && config.api_base.is_none() {
            return Err(CallerError::Config(
                "provider kind 'custom' requires api_base".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CallerError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ModelCaller for OpenAiCaller {
    async fn call(&self, request: ChatRequest) -> Result<String, CallerError> {
        let body = build_body(&self.config, &request);
        let url = self.config.endpoint();
        debug!(model = %self.config.model, url, "sending chat request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("chat request failed: {}", e);
                CallerError::from_transport(&e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CallerError::from_transport(&e))?;

        if !status.is_success() {
            error!(status = %status, "provider returned error: {}", text);
            return Err(CallerError::from_status(status.as_u16(), &text));
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| CallerError::MalformedReply(format!("invalid JSON body: {}", e)))?;
        extract_content(&value)
    }
}

/// Assembles the chat-completions request body.
fn build_body(config: &ProviderConfig, request: &ChatRequest) -> Value {
    let mut messages: Vec<Value> = request
        .system
        .iter()
        .map(|prompt| json!({ "role": "system", "content": prompt }))
        .collect();
    messages.push(json!({ "role": "user", "content": request.user }));

    let mut body = json!({
        "model": config.model,
        "messages": messages,
    });

    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if config.honor_token_bias {
        if let Some(bias) = &request.token_bias {
            // logit_bias keys are token ids as strings
            let mapped: serde_json::Map<String, Value> = bias
                .iter()
                .map(|(token, weight)| (token.to_string(), json!(weight)))
                .collect();
            body["logit_bias"] = Value::Object(mapped);
        }
    }

    body
}

/// Pulls the assistant text out of a chat-completions response.
fn extract_content(value: &Value) -> Result<String, CallerError> {
    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CallerError::MalformedReply("missing choices[0].message.content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> ProviderConfig {
        ProviderConfig::new(ProviderKind::OpenRouter, "google/gemini-2.5-flash", "sk-test")
    }

    #[test]
    fn test_new_rejects_empty_api_key() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "gpt-4o", "");
        assert!(matches!(
            OpenAiCaller::new(config),
            Err(CallerError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_custom_kind_without_api_base() {
        let config = ProviderConfig::new(ProviderKind::Custom, "local-model", "sk-test");
        assert!(matches!(
            OpenAiCaller::new(config),
            Err(CallerError::Config(_))
        ));

        let config = ProviderConfig::new(ProviderKind::Custom, "local-model", "sk-test")
            .with_api_base("http://localhost:8080/v1/chat/completions");
        assert!(OpenAiCaller::new(config).is_ok());
    }

    #[test]
    fn test_body_orders_system_prompts_before_user() {
        let request = ChatRequest::new("the question")
            .with_system("role prompt")
            .with_system("format hint");
        let body = build_body(&config(), &request);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "format hint");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "the question");
    }

    #[test]
    fn test_body_omits_unset_constraints() {
        let body = build_body(&config(), &ChatRequest::new("q"));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
        assert!(body.get("logit_bias").is_none());
    }

    #[test]
    fn test_body_drops_token_bias_unless_honored() {
        let bias: HashMap<u32, i32> = [(9642, 100), (2822, 100)].into_iter().collect();
        let request = ChatRequest::new("q").with_token_bias(bias);

        let silent = build_body(&config(), &request);
        assert!(silent.get("logit_bias").is_none());

        let honoring = config().with_token_bias();
        let sent = build_body(&honoring, &request);
        assert_eq!(sent["logit_bias"]["9642"], 100);
    }

    #[test]
    fn test_extract_content() {
        let value = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Yes" } }]
        });
        assert_eq!(extract_content(&value).unwrap(), "Yes");
    }

    #[test]
    fn test_extract_content_missing_choices() {
        let value = json!({ "error": { "message": "nope" } });
        assert!(matches!(
            extract_content(&value),
            Err(CallerError::MalformedReply(_))
        ));
    }
}
