use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::builder::ChatServiceBuilder;
use super::retry::RetryPolicy;
use crate::cache::{CacheKeyGenerator, ResponseCache};
use crate::config::ConfigManager;
use crate::drivers::ProviderFactory;
use crate::session::SessionStore;
use crate::types::{Message, NormalizedResult, UsageStats};
use crate::{Error, ErrorContext, Result};

/// Longest accepted user message, in characters.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Successful chat turn as returned across the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub model: String,
    pub usage: Option<UsageStats>,
}

/// The chat relay: configuration, session history, provider selection,
/// retry orchestration and the optional response cache, owned together and
/// shared by reference with every request handler.
pub struct ChatService {
    pub(crate) config: ConfigManager,
    pub(crate) sessions: SessionStore,
    pub(crate) factory: Arc<dyn ProviderFactory>,
    pub(crate) retry: RetryPolicy,
    pub(crate) cache: Option<ResponseCache>,
    pub(crate) cache_keys: CacheKeyGenerator,
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::new()
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Reject text that is blank after trimming or longer than
    /// [`MAX_INPUT_CHARS`]. Nothing else is touched.
    pub fn validate_user_input(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::input_with_context(
                "Message cannot be empty",
                ErrorContext::new()
                    .with_field_path("payload.message")
                    .with_source("input_validator"),
            ));
        }
        let len = text.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(Error::input_with_context(
                format!("Message is too long, keep it within {} characters", MAX_INPUT_CHARS),
                ErrorContext::new()
                    .with_field_path("payload.message")
                    .with_details(format!("length {}", len))
                    .with_source("input_validator"),
            ));
        }
        Ok(())
    }

    /// Send one user message and return the normalized reply.
    pub async fn submit_user_message(&self, text: &str) -> Result<NormalizedResult> {
        let reply = self.chat(text).await?;
        Ok(NormalizedResult {
            content: reply.content,
            model: reply.model,
            usage: reply.usage,
        })
    }

    /// One chat turn.
    ///
    /// The user message is appended only once input and API key checks
    /// pass. If the provider call then fails, the user message stays in the
    /// session and the classified error is returned.
    pub async fn chat(&self, text: &str) -> Result<ChatReply> {
        Self::validate_user_input(text)?;

        let config = self.config.load().await?;
        if !config.has_api_key() {
            return Err(Error::configuration_with_context(
                "Please configure your AI API key in settings first",
                ErrorContext::new()
                    .with_field_path("aiApiKey")
                    .with_source("chat_service"),
            ));
        }
        let provider = self.factory.create(&config);

        let session = self.sessions.append_message(Message::user(text)).await?;

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| self.cache_keys.generate(&config, &session.messages));
        let cached = match (&self.cache, &cache_key) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };

        let result = match cached {
            Some(hit) => {
                debug!(session_id = %session.id, "answered from response cache");
                hit
            }
            None => {
                let fresh = self.retry.invoke(provider.as_ref(), &session.messages, &config).await?;
                if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                    cache.set(key, fresh.clone());
                }
                fresh
            }
        };

        let session = self.sessions.append_message(Message::from_result(&result)).await?;
        info!(
            session_id = %session.id,
            provider = %config.provider,
            messages = session.messages.len(),
            "chat turn complete"
        );

        Ok(ChatReply {
            content: result.content,
            session_id: session.id,
            model: result.model,
            usage: result.usage,
        })
    }
}
