//! Error classification logic

use crate::Error;

/// What a failed attempt means for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Invalid or missing API key. Never retried.
    Credential,
    /// Quota or usage limit exceeded. Never retried.
    UsageLimit,
    /// The client could not reach the provider. Never retried.
    Network,
    /// The attempt deadline fired. Retried until the budget runs out.
    Timeout,
    /// Anything else. Retried until the budget runs out.
    Other,
}

impl FailureClass {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureClass::Timeout | FailureClass::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Credential => "credential",
            FailureClass::UsageLimit => "usage_limit",
            FailureClass::Network => "network",
            FailureClass::Timeout => "timeout",
            FailureClass::Other => "other",
        }
    }
}

/// Classify an attempt failure. Checks run in a fixed order and the first
/// match wins: credential, usage limit, network, timeout, other.
pub fn classify(err: &Error) -> FailureClass {
    let text = err.to_string().to_lowercase();

    // Anthropic reports a bad key as "invalid x-api-key", so the status and
    // the local configuration kind are checked alongside the message.
    if text.contains("api key")
        || matches!(err, Error::Configuration { .. })
        || err.http_status() == Some(401)
    {
        return FailureClass::Credential;
    }

    if text.contains("quota") || text.contains("limit") || err.http_status() == Some(429) {
        return FailureClass::UsageLimit;
    }

    if matches!(err, Error::Transport(_) | Error::Network { .. })
        || text.contains("network")
        || text.contains("fetch")
    {
        return FailureClass::Network;
    }

    if matches!(err, Error::Timeout { .. }) {
        return FailureClass::Timeout;
    }

    FailureClass::Other
}
