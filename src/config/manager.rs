use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::{validate, Configuration, ProviderKind, PublicConfiguration, STORED_KEYS};
use crate::storage::KeyValueStore;
use crate::{Error, ErrorContext, Result};

/// Loads and saves the process-wide [`Configuration`].
///
/// Validation runs on both paths: a value read back from the store is coerced
/// before use, and a newly supplied value is coerced before it is written.
#[derive(Clone)]
pub struct ConfigManager {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Configuration> {
        let stored = self.store.get(&STORED_KEYS).await?;
        let mut raw = Configuration::stored_defaults();
        if let Value::Object(ref mut map) = raw {
            for (k, v) in stored {
                // A stored null counts as never written.
                if !v.is_null() {
                    map.insert(k, v);
                }
            }
        }
        let config = validate(&raw);
        debug!(provider = %config.provider, model = %config.model, backend = self.store.name(), "configuration loaded");
        Ok(config)
    }

    /// Validate arbitrary settings and persist the result.
    pub async fn save(&self, raw: &Value) -> Result<Configuration> {
        let config = validate(raw);
        self.store.set(config.to_stored()).await?;
        info!(
            provider = %config.provider,
            model = %config.model,
            has_api_key = config.has_api_key(),
            "configuration saved"
        );
        Ok(config)
    }

    /// Apply a partial settings object on top of the current configuration.
    pub async fn update(&self, patch: &Value) -> Result<Configuration> {
        let Some(fields) = patch.as_object() else {
            return Err(Error::configuration_with_context(
                "Settings update must be a JSON object",
                ErrorContext::new().with_source("config_update"),
            ));
        };
        let current = self.load().await?;
        let mut merged = current.to_stored();
        for (k, v) in fields {
            merged.insert(k.clone(), v.clone());
        }
        // Switching provider without naming a model: keep the old model only if
        // the new provider serves it.
        let new_provider = fields
            .get("aiService")
            .and_then(Value::as_str)
            .and_then(ProviderKind::from_id);
        if let Some(provider) = new_provider {
            let model_given = fields.get("aiModel").is_some_and(|m| !m.is_null());
            let served = provider.models().iter().any(|m| m.id == current.model);
            if provider != current.provider && !model_given && !served {
                merged.insert("aiModel".into(), Value::String(provider.default_model().into()));
            }
        }
        self.save(&Value::Object(merged)).await
    }

    pub async fn save_config(&self, config: &Configuration) -> Result<Configuration> {
        self.save(&Value::Object(config.to_stored())).await
    }

    /// Restore defaults; the stored API key is cleared as well.
    pub async fn reset(&self) -> Result<Configuration> {
        self.save_config(&Configuration::default()).await
    }

    pub async fn load_public(&self) -> Result<PublicConfiguration> {
        Ok(self.load().await?.public())
    }

    pub async fn export_json(&self) -> Result<String> {
        self.load().await?.export_json()
    }

    pub async fn import_json(&self, text: &str) -> Result<Configuration> {
        let imported = Configuration::import_json(text)?;
        self.save_config(&imported).await
    }
}
