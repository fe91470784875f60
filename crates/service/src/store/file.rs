use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::StringStore;
use crate::errors::ServiceError;

/// JSON file-backed string store for local development.
///
/// Keeps a `record_key -> value` map in memory and rewrites the whole file on
/// every put. The write lock is held across the file write so concurrent puts
/// land on disk in the same order they land in the map.
#[derive(Clone)]
pub struct FileStringStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    file_path: PathBuf,
}

impl FileStringStore {
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Store(format!("{} is not a JSON string map: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<String, String> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::store)?)
                    .await
                    .map_err(ServiceError::store)?;
                empty
            }
            // 其他读错误（权限、目录等）不能当作空文件处理，否则会覆盖已保存的值
            Err(e) => {
                return Err(ServiceError::Store(format!("cannot read {}: {e}", file_path.display())));
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self, map: &HashMap<String, String>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(ServiceError::store)?;
        fs::write(&self.file_path, data).await.map_err(ServiceError::store)?;
        Ok(())
    }
}

#[async_trait]
impl StringStore for FileStringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&map).await {
            // 落盘失败时回滚内存中的值，避免内存与文件不一致
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        debug!(path = %self.file_path.display(), key, "saved string to file");
        Ok(())
    }
}
