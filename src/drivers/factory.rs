use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::{AnthropicDriver, ChatProvider, HttpProvider, OpenAiDriver, ProviderDriver};
use crate::config::{Configuration, ProviderKind};
use crate::transport::HttpTransport;

/// Selects the adapter for a configuration.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, config: &Configuration) -> Arc<dyn ChatProvider>;
}

/// Map a provider tag to its driver.
///
/// Validated configurations only carry known tags; raw ids that fail
/// [`ProviderKind::from_id`] resolve to the default (OpenAI-compatible)
/// driver through `ProviderKind::default()`.
pub fn create_driver(kind: ProviderKind, endpoint: impl Into<String>) -> Box<dyn ProviderDriver> {
    match kind {
        ProviderKind::OpenAi | ProviderKind::DeepSeek => Box::new(OpenAiDriver::new(kind, endpoint)),
        ProviderKind::Claude => Box::new(AnthropicDriver::new(endpoint)),
    }
}

/// Factory for real HTTP adapters sharing one transport.
#[derive(Clone)]
pub struct HttpProviderFactory {
    transport: HttpTransport,
    endpoints: HashMap<ProviderKind, String>,
}

impl HttpProviderFactory {
    /// Endpoints default to each provider's public URL and can be overridden
    /// through `AI_CHAT_<PROVIDER>_BASE_URL`.
    pub fn new(transport: HttpTransport) -> Self {
        let mut endpoints = HashMap::new();
        for kind in ProviderKind::ALL {
            if let Ok(raw) = std::env::var(kind.endpoint_env_var()) {
                match url::Url::parse(raw.trim()) {
                    Ok(u) => {
                        endpoints.insert(kind, u.to_string());
                    }
                    Err(e) => warn!(provider = kind.id(), error = %e, "ignoring invalid endpoint override"),
                }
            }
        }
        Self { transport, endpoints }
    }

    pub fn with_endpoint(mut self, kind: ProviderKind, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(kind, endpoint.into());
        self
    }

    pub fn endpoint(&self, kind: ProviderKind) -> &str {
        self.endpoints
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_endpoint())
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, config: &Configuration) -> Arc<dyn ChatProvider> {
        let driver = create_driver(config.provider, self.endpoint(config.provider));
        Arc::new(HttpProvider::new(driver, self.transport.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_driver_mapping() {
        for kind in ProviderKind::ALL {
            let d = create_driver(kind, kind.default_endpoint());
            assert_eq!(d.provider(), kind);
            assert_eq!(d.endpoint(), kind.default_endpoint());
        }
    }

    #[test]
    fn test_unknown_id_falls_back_to_openai() {
        let kind = ProviderKind::from_id("mistral").unwrap_or_default();
        let d = create_driver(kind, kind.default_endpoint());
        assert_eq!(d.provider(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_factory_endpoint_override() {
        let factory = HttpProviderFactory::new(HttpTransport::with_client(reqwest::Client::new()))
            .with_endpoint(ProviderKind::DeepSeek, "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(factory.endpoint(ProviderKind::DeepSeek), "http://127.0.0.1:9/v1/chat/completions");
        let cfg = Configuration {
            provider: ProviderKind::DeepSeek,
            ..Configuration::default()
        };
        assert_eq!(factory.create(&cfg).provider(), ProviderKind::DeepSeek);
    }
}
