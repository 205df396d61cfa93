use crate::types::{Article, HeadlinesQuery, Result, SearchQuery};
use async_trait::async_trait;

/// Trait for the remote news-search provider (top headlines and full-text search)
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Human-readable name for this provider
    fn provider_name(&self) -> String;

    /// Fetch the top-of-feed articles for a country
    async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<Vec<Article>>;

    /// Fetch one page of full-text search results
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>>;
}
