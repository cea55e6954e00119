//! Total coercion of raw settings into a [`Configuration`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Configuration, ProviderKind, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::{Error, ErrorContext, Result};

pub const ALLOWED_MAX_TOKENS: [u32; 4] = [512, 1024, 2048, 4096];

const MIN_API_KEY_LEN: usize = 10;

static OPENAI_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^sk-").expect("valid regex"));
static CLAUDE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^sk-ant-").expect("valid regex"));
static DEEPSEEK_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{20,}$").expect("valid regex"));

/// Coerce raw settings into a valid [`Configuration`]. Never fails.
///
/// Each field is checked independently; an invalid value is replaced by its
/// default rather than rejected:
/// - `aiService`: `openai` unless one of the known provider ids
/// - `aiApiKey`: empty unless textual
/// - `aiModel`: the provider's default model unless non-empty text
/// - `aiTemperature`: `0.7` unless a number in `[0, 2]`
/// - `aiMaxTokens`: `1024` unless one of [`ALLOWED_MAX_TOKENS`]
/// - `showNotifications` / `autoSave`: truthiness of the raw value
pub fn validate(raw: &Value) -> Configuration {
    let field = |name: &str| raw.get(name);

    let provider = field("aiService")
        .and_then(Value::as_str)
        .and_then(ProviderKind::from_id)
        .unwrap_or_default();

    let api_key = field("aiApiKey")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    let model = field("aiModel")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| provider.default_model().to_string());

    let temperature = field("aiTemperature")
        .and_then(Value::as_f64)
        .filter(|t| (0.0..=2.0).contains(t))
        .unwrap_or(DEFAULT_TEMPERATURE);

    // 1024.0 is accepted the same as 1024.
    let max_tokens = field("aiMaxTokens")
        .and_then(Value::as_f64)
        .and_then(|n| ALLOWED_MAX_TOKENS.into_iter().find(|a| f64::from(*a) == n))
        .unwrap_or(DEFAULT_MAX_TOKENS);

    Configuration {
        provider,
        api_key,
        model,
        temperature,
        max_tokens,
        show_notifications: is_truthy(field("showNotifications")),
        auto_save: is_truthy(field("autoSave")),
    }
}

/// Loose truthiness: absent, `null`, `false`, `0`, `NaN` and `""` are false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Format check for a key entered on the settings surface.
///
/// Stored data is never rejected by [`validate`]; this check is for fresh
/// user input only.
pub fn check_api_key_format(provider: ProviderKind, api_key: &str) -> Result<()> {
    let key = api_key.trim();
    let ctx = || {
        ErrorContext::new()
            .with_field_path("aiApiKey")
            .with_source("api_key_format")
    };
    if key.is_empty() {
        return Err(Error::configuration_with_context("Please enter an API key", ctx()));
    }
    if key.chars().count() < MIN_API_KEY_LEN {
        return Err(Error::configuration_with_context(
            "API key format is incorrect, please check it",
            ctx().with_details(format!("at least {MIN_API_KEY_LEN} characters expected")),
        ));
    }
    let pattern: &Regex = match provider {
        ProviderKind::OpenAi => &OPENAI_KEY,
        ProviderKind::Claude => &CLAUDE_KEY,
        ProviderKind::DeepSeek => &DEEPSEEK_KEY,
    };
    if !pattern.is_match(key) {
        return Err(Error::configuration_with_context(
            format!("{} API key format is incorrect", provider.display_name()),
            ctx().with_details(format!("expected pattern {}", pattern.as_str())),
        ));
    }
    Ok(())
}
