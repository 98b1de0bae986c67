//! # MAGI Provider
//!
//! The external model caller boundary of the MAGI decision system.
//!
//! The core pipeline talks to language models exclusively through the
//! [`ModelCaller`] trait; it neither knows nor cares which provider serves
//! a request. This crate supplies:
//!
//! - the [`ModelCaller`] contract and its [`ChatRequest`] payload,
//! - classified failure kinds ([`CallerError`]) so callers can pick the
//!   right recovery strategy,
//! - an [`OpenAiCaller`] for any chat-completions-compatible endpoint,
//! - a bounded [`RetryPolicy`] with exponential backoff that retries only
//!   transient failures.
//!
//! Provider selection is explicit configuration ([`ProviderConfig`])
//! threaded in at construction time; nothing here reads the process
//! environment.

pub mod caller;
pub mod config;
pub mod error;
pub mod openai;
pub mod retry;

pub use caller::{ChatRequest, ModelCaller};
pub use config::{ProviderConfig, ProviderKind};
pub use error::CallerError;
pub use openai::OpenAiCaller;
pub use retry::RetryPolicy;
