//! Backends for the single saved string.
//!
//! Every backend is addressed by record key and only ever holds strings.
//! `get` returns `Ok(None)` when nothing was written under the key yet, so
//! callers decide what "absent" means instead of tripping over a lookup fault.

pub mod dynamo;
pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use configs::{StoreBackend, StoreConfig};
use tracing::info;

use crate::errors::ServiceError;

pub use dynamo::DynamoStringStore;
pub use file::FileStringStore;
pub use memory::MemoryStringStore;

#[async_trait]
pub trait StringStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    /// Insert or overwrite the value stored under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError>;
}

/// Build the configured backend once; the returned handle is shared by all requests.
pub async fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn StringStore>, ServiceError> {
    let store: Arc<dyn StringStore> = match cfg.backend {
        StoreBackend::Dynamodb => Arc::new(DynamoStringStore::from_config(cfg).await),
        StoreBackend::Memory => Arc::new(MemoryStringStore::new()),
        StoreBackend::File => FileStringStore::new(&cfg.file_path).await?,
    };
    info!(backend = ?cfg.backend, table = %cfg.table_name, "string store ready");
    Ok(store)
}
