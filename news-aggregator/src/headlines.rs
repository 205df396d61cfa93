use crate::cache::{CacheKey, NewsCache};
use crate::traits::NewsProvider;
use crate::types::{Article, HeadlinesQuery, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Top-of-feed articles for a country, cache first.
pub struct HeadlineFetcher {
    provider: Arc<dyn NewsProvider>,
    cache: NewsCache,
    max_age_hours: u32,
}

impl HeadlineFetcher {
    pub fn new(provider: Arc<dyn NewsProvider>, cache: NewsCache, max_age_hours: u32) -> Self {
        Self {
            provider,
            cache,
            max_age_hours,
        }
    }

    /// A fresh cache hit returns without touching the network. On a miss one
    /// provider request is made; a failed request leaves the cache untouched.
    pub async fn fetch_headlines(&self, country: &str) -> Result<Vec<Article>> {
        let key = CacheKey::headlines(country);

        if let Some(entry) = self.cache.lookup_fresh(&key, self.max_age_hours).await {
            return Ok(entry.payload);
        }

        debug!("Fetching headlines for {} from {}", country, self.provider.provider_name());
        let articles = self.provider.top_headlines(&HeadlinesQuery::new(country)).await?;

        if let Err(e) = self.cache.put(&key, &articles).await {
            warn!("Failed to cache headlines for {}: {}", country, e);
        }

        info!("Fetched {} headlines for {}", articles.len(), country);
        Ok(articles)
    }
}
