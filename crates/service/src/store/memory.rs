use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StringStore;
use crate::errors::ServiceError;

/// Process-local backend. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStringStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStringStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StringStore for MemoryStringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_upserts() -> Result<(), anyhow::Error> {
        let store = MemoryStringStore::new();
        assert_eq!(store.get("main").await?, None);

        store.put("main", "first").await?;
        store.put("main", "second").await?;
        assert_eq!(store.get("main").await?.as_deref(), Some("second"));

        // clones share the same map
        let other = store.clone();
        other.put("main", "third").await?;
        assert_eq!(store.get("main").await?.as_deref(), Some("third"));
        assert_eq!(store.get("other").await?, None);
        Ok(())
    }
}
