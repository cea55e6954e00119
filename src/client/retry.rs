use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

use super::error_classification::{classify, FailureClass};
use crate::config::Configuration;
use crate::drivers::ChatProvider;
use crate::types::{Message, NormalizedResult};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Deadline, classification and bounded exponential backoff around a single
/// adapter invocation.
///
/// This is the only place in the crate that decides between retrying and
/// failing fast.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
    /// Add a uniform `[0, 1)` second jitter to each backoff.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_jitter(mut self, enable: bool) -> Self {
        self.jitter = enable;
        self
    }

    /// Wait after the failed `attempt` (1-based): `base * 2^attempt`, plus jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let base = self.base_delay.saturating_mul(factor);
        if self.jitter {
            base + Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0))
        } else {
            base
        }
    }

    /// Run `provider.generate` with up to `max_attempts` tries.
    ///
    /// Each try races the call against `attempt_timeout`; the losing call is
    /// dropped and its outcome never observed. Credential, usage-limit and
    /// network failures end the loop on the spot. Timeouts and other
    /// failures are retried until the last attempt, after which a timeout is
    /// returned as-is and anything else becomes [`Error::Service`].
    pub async fn invoke(
        &self,
        provider: &dyn ChatProvider,
        messages: &[Message],
        config: &Configuration,
    ) -> Result<NormalizedResult> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let started = tokio::time::Instant::now();
            let outcome = tokio::time::timeout(self.attempt_timeout, provider.generate(messages, config)).await;
            let err = match outcome {
                Ok(Ok(result)) => {
                    info!(
                        provider = provider.provider().id(),
                        model = result.model.as_str(),
                        attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "chat completion succeeded"
                    );
                    return Ok(result);
                }
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout {
                    after: self.attempt_timeout,
                },
            };

            let class = classify(&err);
            warn!(
                provider = provider.provider().id(),
                attempt,
                max_attempts,
                class = class.as_str(),
                error = %err,
                "chat attempt failed"
            );

            match class {
                FailureClass::Credential => return Err(credential_error(err)),
                FailureClass::UsageLimit => {
                    return Err(Error::UsageLimit {
                        detail: err.user_message(),
                    })
                }
                FailureClass::Network => {
                    return Err(Error::Network {
                        detail: err.user_message(),
                    })
                }
                FailureClass::Timeout if attempt >= max_attempts => return Err(err),
                FailureClass::Other if attempt >= max_attempts => {
                    return Err(Error::Service {
                        message: err.user_message(),
                    })
                }
                FailureClass::Timeout | FailureClass::Other => {}
            }

            let delay = self.backoff_delay(attempt);
            info!(attempt, delay_ms = delay.as_millis() as u64, "retrying chat request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

// A locally detected missing key is already actionable; upstream rejections
// are rewritten into the generic credential message.
fn credential_error(err: Error) -> Error {
    match err {
        Error::Configuration { .. } => err,
        other => Error::configuration_with_context(
            "API key is invalid or not set, please check your settings",
            ErrorContext::new()
                .with_field_path("aiApiKey")
                .with_details(other.user_message())
                .with_source("retry_orchestrator"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_without_jitter() {
        let p = RetryPolicy::default().with_jitter(false);
        assert_eq!(p.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(p.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(p.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_jitter_is_bounded() {
        let p = RetryPolicy::default();
        for _ in 0..100 {
            let d = p.backoff_delay(1);
            assert!(d >= Duration::from_secs(2));
            assert!(d < Duration::from_secs(3));
        }
    }

    #[test]
    fn test_max_attempts_floor() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_credential_rewrite() {
        let local = Error::configuration("OpenAI API key not configured");
        assert_eq!(credential_error(local).user_message(), "OpenAI API key not configured");

        let remote = Error::Upstream {
            provider: "OpenAI".into(),
            status: 401,
            message: "Incorrect API key provided".into(),
        };
        let err = credential_error(remote);
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.user_message().contains("invalid or not set"));
        assert_eq!(err.context().and_then(|c| c.field_path.as_deref()), Some("aiApiKey"));
    }
}
