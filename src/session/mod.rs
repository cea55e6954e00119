//! 会话模块：追加式对话记录及其持久化。
//!
//! # Session Module
//!
//! A [`Session`] is one ordered conversation. The [`SessionStore`] keeps the
//! current session in memory and writes the whole record through to the local
//! key-value namespace (key `chat_session_<id>`) on every append.

mod store;

pub use store::SessionStore;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::message::now_millis;
use crate::types::{Message, MessageRole};

pub const SESSION_KEY_PREFIX: &str = "chat_session_";

const TITLE_MAX_CHARS: usize = 50;
const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "startTime", with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        let start_time = now_millis();
        Self {
            id: generate_session_id(start_time),
            start_time,
            messages: Vec::new(),
        }
    }

    pub fn storage_key(&self) -> String {
        session_key(&self.id)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            start_time: self.start_time,
            message_count: self.messages.len(),
            title: self.title(),
        }
    }

    /// First user message, shortened for list views.
    pub fn title(&self) -> Option<String> {
        let first = self
            .messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .or_else(|| self.messages.first())?;
        if first.content.chars().count() > TITLE_MAX_CHARS {
            let head: String = first.content.chars().take(TITLE_MAX_CHARS).collect();
            Some(format!("{head}..."))
        } else {
            Some(first.content.clone())
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact listing entry for history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(rename = "startTime", with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub fn session_key(id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{id}")
}

/// `session_<unix millis>_<9 random base36 chars>`.
pub fn generate_session_id(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{}", at.timestamp_millis(), suffix)
}
