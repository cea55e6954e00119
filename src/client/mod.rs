//! 聊天服务：输入校验、会话追加、重试编排与响应缓存。
//!
//! Chat service surface. Implementation details are split into submodules:
//! the retry orchestrator and its error classifier, the service itself and
//! its builder.

pub mod builder;
pub mod core;
pub mod error_classification;
pub mod retry;

pub use builder::ChatServiceBuilder;
pub use core::{ChatReply, ChatService, MAX_INPUT_CHARS};
pub use error_classification::{classify, FailureClass};
pub use retry::RetryPolicy;
