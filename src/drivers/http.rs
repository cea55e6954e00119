use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::{ChatProvider, ProviderDriver};
use crate::config::{Configuration, ProviderKind};
use crate::transport::{HttpTransport, TransportError};
use crate::types::{Message, NormalizedResult};
use crate::{Error, ErrorContext, Result};

/// A provider driver bound to the shared HTTP transport.
pub struct HttpProvider {
    driver: Box<dyn ProviderDriver>,
    transport: HttpTransport,
}

impl HttpProvider {
    pub fn new(driver: Box<dyn ProviderDriver>, transport: HttpTransport) -> Self {
        Self { driver, transport }
    }
}

#[async_trait]
impl ChatProvider for HttpProvider {
    fn provider(&self) -> ProviderKind {
        self.driver.provider()
    }

    async fn generate(&self, messages: &[Message], config: &Configuration) -> Result<NormalizedResult> {
        let kind = self.driver.provider();
        if !config.has_api_key() {
            return Err(Error::configuration_with_context(
                format!("{} API key not configured", kind.display_name()),
                ErrorContext::new()
                    .with_field_path("aiApiKey")
                    .with_source("provider_adapter"),
            ));
        }

        let request = self.driver.build_request(messages, config);
        let client_request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let reply = self
            .transport
            .post_json(&request.url, &request.headers, &request.body, Some(&client_request_id))
            .await?;

        if !reply.is_success() {
            let message = serde_json::from_str::<Value>(&reply.body)
                .ok()
                .and_then(|b| self.driver.error_message(&b))
                .unwrap_or_else(|| {
                    if reply.reason.is_empty() {
                        format!("HTTP {}", reply.status)
                    } else {
                        reply.reason.clone()
                    }
                });
            info!(
                provider = kind.id(),
                http_status = reply.status,
                request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "provider request failed"
            );
            return Err(Error::Upstream {
                provider: kind.display_name().to_string(),
                status: reply.status,
                message,
            });
        }

        let body: Value = serde_json::from_str(&reply.body)
            .map_err(|e| Error::Transport(TransportError::Decode(e.to_string())))?;
        let result = self.driver.parse_response(&body, config);

        info!(
            provider = kind.id(),
            model = result.model.as_str(),
            http_status = reply.status,
            request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "provider request succeeded"
        );
        Ok(result)
    }
}
