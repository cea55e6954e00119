use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::KeyValueStore;
use crate::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for k in keys {
            entries.remove(*k);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_remove() {
        let store = MemoryStore::new();
        let mut items = Map::new();
        items.insert("a".into(), json!(1));
        items.insert("b".into(), json!({"x": true}));
        store.set(items).await.unwrap();

        let got = store.get(&["a", "missing"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!(1));

        store.remove(&["a"]).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_all().await.unwrap()["b"]["x"], json!(true));
    }
}
