use std::sync::Arc;
use std::time::Duration;

use super::core::ChatService;
use super::retry::RetryPolicy;
use crate::cache::{CacheConfig, CacheKeyGenerator, ResponseCache};
use crate::config::{ConfigManager, ProviderKind};
use crate::drivers::{HttpProviderFactory, ProviderFactory};
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};

/// Builder for [`ChatService`].
///
/// Everything has a default: in-memory storage, the standard retry policy,
/// no response cache and real HTTP adapters.
pub struct ChatServiceBuilder {
    storage: Option<Storage>,
    retry: RetryPolicy,
    cache: Option<CacheConfig>,
    factory: Option<Arc<dyn ProviderFactory>>,
    transport: Option<HttpTransport>,
    endpoints: Vec<(ProviderKind, String)>,
}

impl Default for ChatServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatServiceBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            retry: RetryPolicy::default(),
            cache: None,
            factory: None,
            transport: None,
            endpoints: Vec::new(),
        }
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Per-attempt deadline (default 30s).
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.retry.attempt_timeout = timeout;
        self
    }

    /// Enable the response cache.
    pub fn with_cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Replace the provider factory (test doubles, custom adapters).
    /// Endpoint overrides only apply to the default HTTP factory.
    pub fn provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn transport(mut self, transport: HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the endpoint for one provider.
    ///
    /// This is primarily for testing with mock servers.
    pub fn endpoint(mut self, kind: ProviderKind, url: impl Into<String>) -> Self {
        self.endpoints.push((kind, url.into()));
        self
    }

    pub fn build(self) -> Result<ChatService> {
        for (kind, raw) in &self.endpoints {
            url::Url::parse(raw).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid endpoint URL for {}", kind.display_name()),
                    ErrorContext::new()
                        .with_field_path(kind.endpoint_env_var())
                        .with_details(e.to_string())
                        .with_source("service_builder"),
                )
            })?;
        }

        let factory: Arc<dyn ProviderFactory> = match self.factory {
            Some(f) => f,
            None => {
                let transport = match self.transport {
                    Some(t) => t,
                    None => HttpTransport::new()?,
                };
                let factory = self
                    .endpoints
                    .into_iter()
                    .fold(HttpProviderFactory::new(transport), |f, (kind, url)| {
                        f.with_endpoint(kind, url)
                    });
                Arc::new(factory)
            }
        };

        let storage = self.storage.unwrap_or_else(Storage::in_memory);

        Ok(ChatService {
            config: ConfigManager::new(storage.sync.clone()),
            sessions: SessionStore::new(storage.local.clone()),
            factory,
            retry: self.retry,
            cache: self.cache.map(ResponseCache::new),
            cache_keys: CacheKeyGenerator::new(),
        })
    }
}
