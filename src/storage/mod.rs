//! 存储模块：配置与会话记录的键值持久化抽象。
//!
//! # Storage Module
//!
//! The relay treats persistence as a generic key-value store with two logical
//! namespaces: a small synchronized namespace for the configuration and a
//! larger local namespace for session records.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`KeyValueStore`] | Trait for implementing custom backends |
//! | [`MemoryStore`] | In-process store, used for tests and ephemeral runs |
//! | [`JsonFileStore`] | One JSON document on disk, rewritten atomically |
//! | [`Storage`] | The pair of namespaces handed to the service |

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::Result;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Values for the requested keys; missing keys are simply absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;
    async fn get_all(&self) -> Result<Map<String, Value>>;
    async fn set(&self, items: Map<String, Value>) -> Result<()>;
    async fn remove(&self, keys: &[&str]) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Synchronized (configuration) and local (session) namespaces.
#[derive(Clone)]
pub struct Storage {
    pub sync: Arc<dyn KeyValueStore>,
    pub local: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(sync: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { sync, local }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// `settings.json` and `sessions.json` under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            Arc::new(JsonFileStore::new(dir.join("settings.json"))),
            Arc::new(JsonFileStore::new(dir.join("sessions.json"))),
        )
    }
}
