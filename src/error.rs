use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "aiApiKey", "payload.message")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected format, actual length)
    pub details: Option<String>,
    /// Source of the error (e.g., "input_validator", "config_import")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the chat relay.
///
/// The first five variants are the request taxonomy: bad user input, bad or
/// missing credentials, an upstream rejection, a transport failure and an
/// attempt deadline. The classified variants (`UsageLimit`, `Network`,
/// `Service`) are only produced by the retry orchestrator once it has decided
/// to stop.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {message}{}", format_context(.context))]
    InputValidation {
        message: String,
        context: ErrorContext,
    },

    #[error("{message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("{provider} API error: {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("Usage limit reached, try again later or upgrade your account ({detail})")]
    UsageLimit { detail: String },

    #[error("Network connection failed, check your network settings ({detail})")]
    Network { detail: String },

    #[error("AI service call failed: {message}")]
    Service { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Request channel closed: {message}")]
    Channel { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::input_with_context(msg, ErrorContext::new())
    }

    /// Create a new input validation error with structured context
    pub fn input_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InputValidation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage {
            message: msg.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InputValidation { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// HTTP status reported by the provider, for upstream rejections.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short text suitable for showing to an end user.
    ///
    /// Structured context is left out; it stays available through
    /// [`Error::context`] and the `Display` impl for logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::InputValidation { message, .. } | Error::Configuration { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
