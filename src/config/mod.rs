//! 配置模块：会话设置的校验、持久化与导入导出。
//!
//! # Configuration Module
//!
//! The relay has a single process-wide [`Configuration`]. It is stored in the
//! synchronized key-value namespace under the keys listed in [`STORED_KEYS`]
//! and always passes through [`validate`] on the way in and on the way out, so
//! every component can rely on its field constraints.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Configuration`] | Validated settings, including the secret API key |
//! | [`PublicConfiguration`] | Same settings without the key, for less-trusted contexts |
//! | [`ProviderKind`] | Provider tag with endpoints and model catalogue |
//! | [`ConfigManager`] | Load / save / reset / import / export against a store |

mod manager;
mod provider;
mod validator;

pub use manager::ConfigManager;
pub use provider::{ModelInfo, ProviderKind};
pub use validator::{check_api_key_format, is_truthy, validate, ALLOWED_MAX_TOKENS};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{Error, ErrorContext, Result};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Keys under which the configuration is persisted.
pub const STORED_KEYS: [&str; 7] = [
    "aiService",
    "aiApiKey",
    "aiModel",
    "aiTemperature",
    "aiMaxTokens",
    "showNotifications",
    "autoSave",
];

/// Fields an imported settings document must carry.
pub const REQUIRED_IMPORT_FIELDS: [&str; 4] = ["aiService", "aiModel", "aiTemperature", "aiMaxTokens"];

/// Validated chat settings.
///
/// Values of this type are only produced by [`validate`], so `temperature`
/// is within `[0, 2]` and `max_tokens` is one of [`ALLOWED_MAX_TOKENS`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "aiService")]
    pub provider: ProviderKind,
    #[serde(rename = "aiApiKey")]
    pub api_key: String,
    #[serde(rename = "aiModel")]
    pub model: String,
    #[serde(rename = "aiTemperature")]
    pub temperature: f64,
    #[serde(rename = "aiMaxTokens")]
    pub max_tokens: u32,
    #[serde(rename = "showNotifications")]
    pub show_notifications: bool,
    #[serde(rename = "autoSave")]
    pub auto_save: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: String::new(),
            model: ProviderKind::OpenAi.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            show_notifications: true,
            auto_save: true,
        }
    }
}

// The key never shows up in logs or panics.
impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("show_notifications", &self.show_notifications)
            .field("auto_save", &self.auto_save)
            .finish()
    }
}

impl Configuration {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Stored representation, keyed by [`STORED_KEYS`].
    pub fn to_stored(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // Plain struct of scalars; serialization cannot produce anything else.
            _ => Map::new(),
        }
    }

    pub fn public(&self) -> PublicConfiguration {
        PublicConfiguration {
            provider: self.provider,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            show_notifications: self.show_notifications,
            auto_save: self.auto_save,
        }
    }

    /// Pretty JSON document including the API key.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an exported settings document.
    ///
    /// Fails when the text is not a JSON object or lacks any of
    /// [`REQUIRED_IMPORT_FIELDS`]; everything else is coerced by [`validate`].
    pub fn import_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        let Some(obj) = raw.as_object() else {
            return Err(Error::configuration_with_context(
                "Settings file must contain a JSON object",
                ErrorContext::new().with_source("config_import"),
            ));
        };
        let missing: Vec<&str> = REQUIRED_IMPORT_FIELDS
            .iter()
            .copied()
            .filter(|f| !obj.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration_with_context(
                format!("Settings file is missing required fields: {}", missing.join(", ")),
                ErrorContext::new()
                    .with_field_path(missing.join(","))
                    .with_source("config_import"),
            ));
        }
        Ok(validate(&raw))
    }

    /// Defaults for keys the store has never seen, applied before validation.
    pub(crate) fn stored_defaults() -> Value {
        json!({
            "aiService": "openai",
            "aiApiKey": "",
            "aiModel": ProviderKind::OpenAi.default_model(),
            "aiTemperature": DEFAULT_TEMPERATURE,
            "aiMaxTokens": DEFAULT_MAX_TOKENS,
            "showNotifications": true,
            "autoSave": true,
        })
    }
}

/// Configuration view that may cross into less-trusted contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfiguration {
    #[serde(rename = "aiService")]
    pub provider: ProviderKind,
    #[serde(rename = "aiModel")]
    pub model: String,
    #[serde(rename = "aiTemperature")]
    pub temperature: f64,
    #[serde(rename = "aiMaxTokens")]
    pub max_tokens: u32,
    #[serde(rename = "showNotifications")]
    pub show_notifications: bool,
    #[serde(rename = "autoSave")]
    pub auto_save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        Configuration {
            provider: ProviderKind::Claude,
            api_key: "sk-ant-0123456789".into(),
            model: "claude-3-haiku-20240307".into(),
            temperature: 1.2,
            max_tokens: 2048,
            show_notifications: false,
            auto_save: true,
        }
    }

    #[test]
    fn test_public_view_has_no_key() {
        let v = serde_json::to_value(sample().public()).unwrap();
        assert!(v.get("aiApiKey").is_none());
        assert_eq!(v["aiService"], "claude");
        assert_eq!(v["aiMaxTokens"], 2048);
    }

    #[test]
    fn test_debug_redacts_key() {
        let dbg = format!("{:?}", sample());
        assert!(!dbg.contains("sk-ant"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_export_then_import_preserves_settings() {
        let text = sample().export_json().unwrap();
        assert!(text.contains("sk-ant-0123456789"));
        assert_eq!(Configuration::import_json(&text).unwrap(), sample());
    }

    #[test]
    fn test_import_requires_fields() {
        let err = Configuration::import_json(r#"{"aiService":"openai","aiModel":"gpt-4"}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("aiTemperature"));
        assert!(msg.contains("aiMaxTokens"));
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_import_rejects_non_object() {
        assert!(matches!(Configuration::import_json("[1,2]"), Err(Error::Configuration { .. })));
        assert!(matches!(Configuration::import_json("not json"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_to_stored_uses_stored_keys() {
        let stored = sample().to_stored();
        for key in STORED_KEYS {
            assert!(stored.contains_key(key), "missing {key}");
        }
        assert_eq!(stored.len(), STORED_KEYS.len());
    }
}
