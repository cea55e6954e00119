use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::KeyValueStore;
use crate::{Error, Result};

/// Key-value store persisted as a single JSON object on disk.
///
/// Every mutation rewrites the whole document through a sibling temp file and
/// a rename, so a crash never leaves a half-written file behind. All access
/// goes through one async mutex; concurrent writers are serialized.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_document(&self, doc: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = doc.len(), "store document written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;
        Ok(keys
            .iter()
            .filter_map(|k| doc.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        self.read_document().await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;
        doc.extend(items);
        self.write_document(&doc).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document().await?;
        let before = doc.len();
        for k in keys {
            doc.remove(*k);
        }
        if doc.len() == before {
            return Ok(());
        }
        self.write_document(&doc).await
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}
