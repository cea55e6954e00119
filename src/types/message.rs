//! Conversation message format shared by sessions, adapters and the cache.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::response::{NormalizedResult, UsageStats};

/// A single conversation turn. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageStats>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, text)
    }

    pub fn with_role(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
            timestamp: now_millis(),
            model: None,
            usage: None,
        }
    }

    /// Assistant turn carrying the model and usage reported by the provider.
    pub fn from_result(result: &NormalizedResult) -> Self {
        Self {
            model: Some(result.model.clone()),
            usage: result.usage.clone(),
            ..Self::assistant(result.content.clone())
        }
    }
}

/// Current time at the millisecond precision records are persisted with.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
