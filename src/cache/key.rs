//! Cache key generation.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::Configuration;
use crate::types::Message;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// Field order is fixed by the struct, which keeps the canonical form stable.
#[derive(Serialize)]
struct Canonical<'a> {
    provider: &'a str,
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<CanonicalMessage<'a>>,
}

#[derive(Serialize)]
struct CanonicalMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Fingerprints a normalized request.
///
/// Only what reaches the provider takes part: provider, model, temperature,
/// max tokens and the `{role, content}` sequence. Timestamps and usage on the
/// messages do not, so a replayed conversation maps to the same key.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, config: &Configuration, messages: &[Message]) -> CacheKey {
        let canonical = Canonical {
            provider: config.provider.id(),
            model: &config.model,
            // Full precision: 0.701 and 0.704 are different requests.
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            messages: messages
                .iter()
                .map(|m| CanonicalMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };
        let encoded = serde_json::to_vec(&canonical).unwrap_or_default();
        let digest = Sha256::digest(&encoded);
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey::new(hash)
    }
}
