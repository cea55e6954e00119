use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-reported token counters, passed through untouched.
///
/// OpenAI-style providers report `prompt_tokens`/`completion_tokens`,
/// Anthropic reports `input_tokens`/`output_tokens`; neither is reshaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageStats(pub Value);

impl UsageStats {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for UsageStats {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

/// Adapter output, identical in shape for every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub content: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageStats>,
}
