use anyhow::Result;
use async_trait::async_trait;

/// Generic string-keyed durable store the news pipeline persists into.
///
/// Values are opaque strings; callers own the serialization. Implementations
/// must make `set` a whole-value replacement so readers never observe a
/// partially written value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

// Object style note:
// Stores are shared as `Arc<dyn KeyValueStore>` between the headline fetcher,
// the search collector and the preference store. They do not interpret keys;
// key layout is decided by the pipeline.
