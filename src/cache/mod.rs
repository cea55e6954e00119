//! 响应缓存模块：对相同请求的结果做短期记忆，避免重复调用上游 API。
//!
//! # Response Caching Module
//!
//! An optional optimization layer in front of the provider call. Identical
//! normalized requests (same provider, model, generation options and message
//! sequence) within the time-to-live are answered from memory.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Fixed-capacity store with TTL and insertion-order eviction |
//! | [`CacheConfig`] | Capacity (default 10) and TTL (default 5 minutes) |
//! | [`CacheKeyGenerator`] | Deterministic request fingerprinting |
//! | [`CacheStats`] | Hit/miss/eviction counters |
//!
//! ## Example
//!
//! ```rust
//! use ai_chat_relay::cache::{CacheConfig, CacheKey, ResponseCache};
//! use ai_chat_relay::types::NormalizedResult;
//! use std::time::Duration;
//!
//! let cache = ResponseCache::new(CacheConfig::new().with_ttl(Duration::from_secs(60)));
//! let result = NormalizedResult { content: "hi".into(), model: "gpt-4".into(), usage: None };
//! cache.set(CacheKey::from("abc"), result.clone());
//! assert_eq!(cache.get(&CacheKey::from("abc")), Some(result));
//! ```
//!
//! Whether or not the cache is consulted, callers observe the same results;
//! only latency changes.

mod key;
mod response;

pub use key::{CacheKey, CacheKeyGenerator};
pub use response::{CacheConfig, CacheStats, ResponseCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
