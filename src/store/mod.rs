use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod memory;
pub mod redis;
pub mod sqlite;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use sqlite::SqliteStore;

/// Shared key-value store that external observers poll for live stats.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Replaces whatever is stored under `key`.
    async fn write(&self, key: &str, mapping: &Map<String, Value>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Renders a snapshot as hash fields; strings are stored bare, everything
/// else as its JSON text.
pub(crate) fn hash_fields(mapping: &Map<String, Value>) -> Vec<(String, String)> {
    mapping
        .iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            };
            (field.clone(), text)
        })
        .collect()
}

/// Opens the store named by `url`: `redis://` / `rediss://`, `sqlite:<path>`
/// or `memory:`.
pub async fn connect(url: &str) -> Result<Arc<dyn CounterStore>> {
    if url.is_empty() {
        return Err(Error::Config("stats store URL is empty".to_string()));
    }

    if url.starts_with("redis://") || url.starts_with("rediss://") {
        Ok(Arc::new(RedisStore::connect(url).await?))
    } else if url.starts_with("memory:") {
        Ok(Arc::new(MemoryStore::new()))
    } else if url.starts_with("sqlite:") {
        Ok(Arc::new(SqliteStore::connect(url).await?))
    } else {
        Err(Error::Config(format!("Unsupported stats store URL: {}", url)))
    }
}
