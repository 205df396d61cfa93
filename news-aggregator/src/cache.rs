use crate::freshness;
use crate::types::{Article, Result};
use chrono::{DateTime, Utc};
use interfaces::KeyValueStore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const HEADLINES_PREFIX: &str = "news";
const SEARCH_PREFIX: &str = "newsSearch";
const TIMESTAMP_SUFFIX: &str = "timestamp";

/// Substrate key for one cached request shape.
///
/// Components are escaped so that `_` only ever appears as a separator,
/// which keeps keys for distinct requests (and their timestamp companions)
/// from colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn headlines(country: &str) -> Self {
        Self(format!("{}_{}", HEADLINES_PREFIX, escape_component(country)))
    }

    pub fn search(country: &str, term: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            SEARCH_PREFIX,
            escape_component(country),
            escape_component(term)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_key(&self) -> String {
        format!("{}_{}", self.0, TIMESTAMP_SUFFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_component(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '_' => escaped.push_str("%5F"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Vec<Article>,
    pub captured_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, max_age_hours: u32) -> bool {
        freshness::is_fresh(self.captured_at, max_age_hours)
    }
}

/// Article cache over the persistence substrate. Each entry is stored as a
/// JSON payload plus an epoch-millisecond timestamp under the companion key.
#[derive(Clone)]
pub struct NewsCache {
    store: Arc<dyn KeyValueStore>,
}

impl NewsCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read an entry. Missing, partial or malformed entries are misses.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let payload = match self.store.get(key.as_str()).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let timestamp = match self.store.get(&key.timestamp_key()).await {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => {
                debug!("Cache entry {} has no timestamp, treating as miss", key);
                return None;
            }
            Err(e) => {
                warn!("Cache timestamp read failed for {}: {}", key, e);
                return None;
            }
        };

        let captured_at = match timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(captured_at) => captured_at,
            None => {
                warn!("Malformed cache timestamp for {}: {:?}", key, timestamp);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Article>>(&payload) {
            Ok(payload) => Some(CacheEntry {
                key: key.clone(),
                payload,
                captured_at,
            }),
            Err(e) => {
                warn!("Malformed cache payload for {}: {}", key, e);
                None
            }
        }
    }

    /// Fresh entry for `key`, or `None` when absent, malformed or expired.
    pub async fn lookup_fresh(&self, key: &CacheKey, max_age_hours: u32) -> Option<CacheEntry> {
        let entry = self.get(key).await?;
        let now = Utc::now();
        if freshness::is_fresh_at(entry.captured_at, max_age_hours, now) {
            debug!(
                "Cache hit for {} ({} articles, {}m old)",
                key,
                entry.payload.len(),
                freshness::age_minutes(entry.captured_at, now)
            );
            Some(entry)
        } else {
            debug!(
                "Cache entry {} is stale ({}m old, window {}h)",
                key,
                freshness::age_minutes(entry.captured_at, now),
                max_age_hours
            );
            None
        }
    }

    pub async fn put(&self, key: &CacheKey, payload: &[Article]) -> Result<CacheEntry> {
        self.put_at(key, payload, Utc::now()).await
    }

    /// Store `payload` as captured at `captured_at`, replacing any prior entry.
    pub async fn put_at(&self, key: &CacheKey, payload: &[Article], captured_at: DateTime<Utc>) -> Result<CacheEntry> {
        let serialized = serde_json::to_string(payload)?;
        // Payload without a timestamp reads as a miss, so an interrupted
        // write never pairs the new payload with the old capture time.
        self.store.remove(&key.timestamp_key()).await?;
        self.store.set(key.as_str(), &serialized).await?;
        self.store
            .set(&key.timestamp_key(), &captured_at.timestamp_millis().to_string())
            .await?;

        debug!("Cached {} articles under {}", payload.len(), key);
        Ok(CacheEntry {
            key: key.clone(),
            payload: payload.to_vec(),
            captured_at,
        })
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<()> {
        self.store.remove(key.as_str()).await?;
        self.store.remove(&key.timestamp_key()).await?;
        Ok(())
    }
}
