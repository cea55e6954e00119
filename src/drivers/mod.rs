//! Provider 驱动抽象层 — 通过 trait 实现多厂商 API 适配的动态分发
//!
//! Provider adapters. A [`ProviderDriver`] knows one wire format: how to turn
//! the normalized message list and generation options into a request body and
//! headers, and where the generated text sits in the reply. [`HttpProvider`]
//! pairs a driver with the shared transport and implements the async
//! [`ChatProvider`] contract the orchestrator calls.
//!
//! OpenAI and DeepSeek share the OpenAI-compatible driver and differ only in
//! endpoint; Claude uses the Anthropic Messages driver.

pub mod anthropic;
mod factory;
mod http;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{Configuration, ProviderKind};
use crate::types::{Message, NormalizedResult, UsageStats};
use crate::Result;

pub use anthropic::AnthropicDriver;
pub use factory::{create_driver, HttpProviderFactory, ProviderFactory};
pub use http::HttpProvider;

/// Provider-specific HTTP request, ready to send.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

#[cfg(test)]
impl DriverRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The adapter contract: normalized messages in, normalized result out.
///
/// Fails with `Error::Configuration` when the API key is empty,
/// `Error::Upstream` on a non-success status and `Error::Transport` when the
/// exchange cannot complete or the reply body is not JSON.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn generate(&self, messages: &[Message], config: &Configuration) -> Result<NormalizedResult>;
}

/// Wire-format translation for one provider API style.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> ProviderKind;

    fn endpoint(&self) -> &str;

    /// Build the non-streaming request. Messages keep their order and role
    /// values; generation options are taken from `config` as-is.
    fn build_request(&self, messages: &[Message], config: &Configuration) -> DriverRequest;

    /// Extract the normalized result from a success body. Missing text
    /// becomes an empty string and a missing model falls back to the
    /// configured one.
    fn parse_response(&self, body: &Value, config: &Configuration) -> NormalizedResult;

    /// Structured error message from an error body, if the provider sent one.
    fn error_message(&self, body: &Value) -> Option<String> {
        body.pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from)
    }
}

/// `{role, content}` pairs in input order.
pub(crate) fn wire_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect()
}

pub(crate) fn extract_model(body: &Value, config: &Configuration) -> String {
    body.get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(&config.model)
        .to_string()
}

pub(crate) fn extract_usage(body: &Value) -> Option<UsageStats> {
    body.get("usage")
        .filter(|u| !u.is_null())
        .cloned()
        .map(UsageStats::from)
}

/// OpenAI-compatible driver — used for OpenAI and DeepSeek.
#[derive(Debug)]
pub struct OpenAiDriver {
    provider: ProviderKind,
    endpoint: String,
}

impl OpenAiDriver {
    pub fn new(provider: ProviderKind, endpoint: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
        }
    }
}

impl ProviderDriver for OpenAiDriver {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, messages: &[Message], config: &Configuration) -> DriverRequest {
        let body = json!({
            "model": config.model,
            "messages": wire_messages(messages),
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "stream": false,
        });

        DriverRequest {
            url: self.endpoint.clone(),
            headers: vec![("Authorization".into(), format!("Bearer {}", config.api_key))],
            body,
        }
    }

    fn parse_response(&self, body: &Value, config: &Configuration) -> NormalizedResult {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        NormalizedResult {
            content,
            model: extract_model(body, config),
            usage: extract_usage(body),
        }
    }
}
