//! # ai-chat-relay
//!
//! 多厂商 AI 对话中继：会话持久化、统一的请求/响应适配、超时与退避重试。
//!
//! Chat relay core: takes user text, keeps an append-only conversation
//! history and forwards it to one of several conversational AI HTTP APIs
//! (OpenAI, Anthropic Claude, DeepSeek), returning a normalized reply.
//!
//! ## Overview
//!
//! A chat turn flows through the crate leaves-first:
//!
//! 1. The input is validated (non-blank, at most 10,000 characters).
//! 2. The [`config::ConfigManager`] loads and coerces the stored settings.
//! 3. The [`drivers::ProviderFactory`] picks the adapter for the configured provider.
//! 4. The [`session::SessionStore`] appends the user message and persists the session.
//! 5. The [`client::RetryPolicy`] invokes the adapter under a 30s deadline,
//!    classifies failures and retries with exponential backoff.
//! 6. The reply is appended as an assistant message and returned.
//!
//! An optional [`cache::ResponseCache`] short-circuits identical requests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_chat_relay::{ChatService, Storage};
//!
//! #[tokio::main]
//! async fn main() -> ai_chat_relay::Result<()> {
//!     let service = ChatService::builder()
//!         .storage(Storage::in_dir(".ai-chat"))
//!         .build()?;
//!
//!     service
//!         .config_manager()
//!         .update(&serde_json::json!({"aiService": "deepseek", "aiApiKey": "your-api-key"}))
//!         .await?;
//!
//!     let reply = service.submit_user_message("Hello").await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages and the normalized provider result |
//! | [`config`] | Settings, validation, provider catalogue |
//! | [`storage`] | Key-value persistence backends |
//! | [`session`] | Conversation history |
//! | [`cache`] | Bounded, time-limited response cache |
//! | [`transport`] | Pooled HTTP client |
//! | [`drivers`] | Per-provider wire formats and the adapter factory |
//! | [`client`] | Retry orchestration and the chat service |
//! | [`rpc`] | Typed request/response contract and worker channel |

pub mod cache;
pub mod client;
pub mod config;
pub mod drivers;
pub mod rpc;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ChatReply, ChatService, ChatServiceBuilder, RetryPolicy};
pub use config::{Configuration, ProviderKind, PublicConfiguration};
pub use rpc::{spawn_service, ServiceHandle, ServiceRequest, ServiceResponse};
pub use session::{Session, SessionSummary};
pub use storage::{KeyValueStore, Storage};
pub use types::{Message, MessageRole, NormalizedResult, UsageStats};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
