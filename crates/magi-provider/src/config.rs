//! Provider configuration.
//!
//! Which provider and model serve a request is an explicit value threaded
//! into the caller at construction time. The endpoint mapping is a pure
//! function of the configuration; there is no hidden process-wide state.

use serde::{Deserialize, Serialize};

/// Known chat-completions-compatible providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com
    OpenAi,
    /// api.deepseek.com
    DeepSeek,
    /// openrouter.ai
    OpenRouter,
    /// api.moonshot.cn
    Moonshot,
    /// open.bigmodel.cn
    Zhipu,
    /// Any other compatible endpoint; requires `api_base`.
    Custom,
}

impl ProviderKind {
    /// The default chat-completions endpoint for this provider.
    ///
    /// `Custom` has no meaningful default; [`crate::OpenAiCaller`]
    /// rejects a custom configuration without an `api_base` override.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi | Self::Custom => "https://api.openai.com/v1/chat/completions",
            Self::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            Self::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            Self::Moonshot => "https://api.moonshot.cn/v1/chat/completions",
            Self::Zhipu => "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::OpenRouter
    }
}

/// Configuration for one model caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider serves the requests.
    pub kind: ProviderKind,
    /// Model identifier, in the provider's naming scheme.
    pub model: String,
    /// Bearer token for the provider.
    pub api_key: String,
    /// Endpoint override; takes precedence over the kind's default.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the endpoint accepts the `logit_bias` field.
    ///
    /// Only some chat-completions providers do; when false, token bias
    /// hints in requests are dropped rather than sent.
    #[serde(default)]
    pub honor_token_bias: bool,
}

fn default_timeout_secs() -> u64 {
    120
}

impl ProviderConfig {
    /// Creates a configuration with default timeout and no overrides.
    pub fn new(kind: ProviderKind, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            api_key: api_key.into(),
            api_base: None,
            timeout_secs: default_timeout_secs(),
            honor_token_bias: false,
        }
    }

    /// Overrides the endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Marks the endpoint as accepting `logit_bias`.
    pub fn with_token_bias(mut self) -> Self {
        self.honor_token_bias = true;
        self
    }

    /// The effective endpoint: the override when present, otherwise the
    /// kind's default.
    pub fn endpoint(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
    }
}
