//! 类型系统模块：会话消息与归一化响应。
//!
//! # Types Module
//!
//! Core data types shared by every component of the relay.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | One conversation turn (role, content, timestamp, optional model/usage) |
//! | [`MessageRole`] | `user` or `assistant` |
//! | [`NormalizedResult`] | Provider-independent adapter output |
//! | [`UsageStats`] | Opaque provider usage counters |
//!
//! ## Example
//!
//! ```rust
//! use ai_chat_relay::types::{Message, MessageRole};
//!
//! let msg = Message::user("What's the weather?");
//! assert_eq!(msg.role, MessageRole::User);
//! ```

pub mod message;
pub mod response;

pub use message::{Message, MessageRole};
pub use response::{NormalizedResult, UsageStats};
