//! Anthropic Messages API 驱动 — 实现 Anthropic 特有的请求/响应格式转换
//!
//! Anthropic Messages API driver. Differences from the OpenAI-compatible shape:
//! - The key travels in `x-api-key`, alongside a fixed `anthropic-version` header.
//! - Response text is at `content[0].text` instead of `choices[0].message.content`.
//! - Usage is reported as `input_tokens`/`output_tokens` and passed through as-is.

use serde_json::{json, Value};

use crate::config::{Configuration, ProviderKind};
use crate::types::{Message, NormalizedResult};

use super::{extract_model, extract_usage, wire_messages, DriverRequest, ProviderDriver};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API driver.
#[derive(Debug)]
pub struct AnthropicDriver {
    endpoint: String,
}

impl AnthropicDriver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProviderDriver for AnthropicDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Claude
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
            headers: vec![
                ("x-api-key".into(), config.api_key.clone()),
                ("anthropic-version".into(), ANTHROPIC_VERSION.into()),
            ],
            body,
        }
    }

    fn parse_response(&self, body: &Value, config: &Configuration) -> NormalizedResult {
        // Anthropic response: { content: [{type: "text", text: "..."}], model, usage }
        let content = body
            .pointer("/content/0/text")
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
