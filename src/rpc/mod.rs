//! Typed request/response contract between the caller (UI, CLI, another
//! task) and the [`ChatService`].
//!
//! Requests are tagged by a method name and carry an optional payload; every
//! reply is a [`ServiceResponse`]. Failures never escape as Rust errors: they
//! become `success = false` with the error's short user-facing text.

mod channel;

pub use channel::{spawn_service, ServiceHandle, DEFAULT_REQUEST_TIMEOUT};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::client::ChatService;
use crate::{Error, Result};

/// Method name plus payload, e.g. `{"type": "AI_CHAT_REQUEST", "payload": {"message": "Hi"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRequest {
    AiChatRequest { message: String },
    GetConfig,
    SetConfig(Value),
    GetChatHistory,
    ClearChatHistory,
    ExportConfig,
    ImportConfig { json: String },
}

impl ServiceRequest {
    pub fn chat(message: impl Into<String>) -> Self {
        ServiceRequest::AiChatRequest {
            message: message.into(),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            ServiceRequest::AiChatRequest { .. } => "AI_CHAT_REQUEST",
            ServiceRequest::GetConfig => "GET_CONFIG",
            ServiceRequest::SetConfig(_) => "SET_CONFIG",
            ServiceRequest::GetChatHistory => "GET_CHAT_HISTORY",
            ServiceRequest::ClearChatHistory => "CLEAR_CHAT_HISTORY",
            ServiceRequest::ExportConfig => "EXPORT_CONFIG",
            ServiceRequest::ImportConfig { .. } => "IMPORT_CONFIG",
        }
    }
}

/// Structured result of any request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::failure(err.user_message())
    }
}

impl From<Result<ServiceResponse>> for ServiceResponse {
    fn from(r: Result<ServiceResponse>) -> Self {
        r.unwrap_or_else(|e| ServiceResponse::from_error(&e))
    }
}

impl ChatService {
    /// Dispatch one typed request.
    pub async fn handle(&self, request: ServiceRequest) -> ServiceResponse {
        let method = request.method();
        let response: ServiceResponse = self.dispatch(request).await.into();
        if let Some(err) = &response.error {
            warn!(method, error = %err, "request failed");
        }
        response
    }

    /// Dispatch a raw JSON request, as received from an untyped channel.
    pub async fn handle_value(&self, raw: Value) -> ServiceResponse {
        match serde_json::from_value::<ServiceRequest>(raw.clone()) {
            Ok(request) => self.handle(request).await,
            Err(e) => match raw.get("type").and_then(Value::as_str) {
                Some("AI_CHAT_REQUEST") => ServiceResponse::failure("Invalid message content"),
                Some(t) if !is_known_method(t) => ServiceResponse::failure(format!("Unknown message type: {t}")),
                _ => ServiceResponse::failure(format!("Malformed request: {e}")),
            },
        }
    }

    async fn dispatch(&self, request: ServiceRequest) -> Result<ServiceResponse> {
        match request {
            ServiceRequest::AiChatRequest { message } => {
                let reply = self.chat(&message).await?;
                Ok(ServiceResponse::with_data(json!({
                    "content": reply.content,
                    "sessionId": reply.session_id,
                    "usage": reply.usage,
                })))
            }
            ServiceRequest::GetConfig => {
                let public = self.config.load_public().await?;
                Ok(ServiceResponse::with_data(serde_json::to_value(public)?))
            }
            ServiceRequest::SetConfig(patch) => {
                self.config.update(&patch).await?;
                Ok(ServiceResponse::ok())
            }
            ServiceRequest::GetChatHistory => {
                let sessions = self.sessions.list_sessions().await?;
                Ok(ServiceResponse::with_data(serde_json::to_value(sessions)?))
            }
            ServiceRequest::ClearChatHistory => {
                self.sessions.clear_all().await?;
                Ok(ServiceResponse::ok())
            }
            ServiceRequest::ExportConfig => {
                let text = self.config.export_json().await?;
                Ok(ServiceResponse::with_data(Value::String(text)))
            }
            ServiceRequest::ImportConfig { json } => {
                let config = self.config.import_json(&json).await?;
                Ok(ServiceResponse::with_data(serde_json::to_value(config.public())?))
            }
        }
    }
}

fn is_known_method(name: &str) -> bool {
    matches!(
        name,
        "AI_CHAT_REQUEST"
            | "GET_CONFIG"
            | "SET_CONFIG"
            | "GET_CHAT_HISTORY"
            | "CLEAR_CHAT_HISTORY"
            | "EXPORT_CONFIG"
            | "IMPORT_CONFIG"
    )
}
