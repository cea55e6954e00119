use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::Result;

/// Raw provider reply, before any provider-specific interpretation.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    /// Canonical reason phrase for `status` (e.g. "Unauthorized"), possibly empty.
    pub reason: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pooled HTTPS client shared by every adapter.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // The orchestrator owns the per-attempt deadline; this is only a
        // backstop so a stuck socket is eventually released.
        let timeout_secs = env_parse::<u64>("AI_CHAT_HTTP_TIMEOUT_SECS").unwrap_or(60);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(env_parse::<usize>("AI_CHAT_HTTP_POOL_MAX_IDLE_PER_HOST").unwrap_or(8))
            .pool_idle_timeout(Some(Duration::from_secs(
                env_parse::<u64>("AI_CHAT_HTTP_POOL_IDLE_TIMEOUT_SECS").unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("AI_CHAT_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Wrap an existing client (custom TLS roots, test harnesses).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST a JSON body. Only failures to complete the exchange are errors;
    /// any HTTP status is returned as an [`HttpReply`].
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
        client_request_id: Option<&str>,
    ) -> Result<HttpReply> {
        let mut req = self.client.post(url).json(body);
        for (k, v) in headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(id) = client_request_id {
            // Our own correlation id. Providers ignore it.
            req = req.header("x-ai-chat-request-id", id);
        }

        let resp = req.send().await.map_err(TransportError::Http)?;
        let status = resp.status();
        let body = resp.text().await.map_err(TransportError::Http)?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "http exchange complete");

        Ok(HttpReply {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Other(String),
}
