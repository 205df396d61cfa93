use crate::cache::{CacheKey, NewsCache};
use crate::traits::NewsProvider;
use crate::types::{country_filter, AggregatorError, Article, Result, SearchQuery};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Categories swept, in request order, for every uncached keyword search.
pub const SEARCH_CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// Pages requested per category.
pub const PAGES_PER_CATEGORY: u32 = 3;

/// Articles requested per page.
pub const PAGE_SIZE: u32 = 20;

/// Pause between consecutive page requests, to stay under the provider's
/// rate limit.
pub const INTER_PAGE_DELAY: Duration = Duration::from_millis(250);

/// Provider requests issued by one uncached search with the default sweep
/// (7 categories x 3 pages = 21). At 250ms apart that is roughly five seconds
/// of pacing before network time.
pub const SWEEP_REQUESTS: usize = SEARCH_CATEGORIES.len() * PAGES_PER_CATEGORY as usize;

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub categories: Vec<String>,
    pub pages_per_category: u32,
    pub page_size: u32,
    pub page_delay: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            categories: SEARCH_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            pages_per_category: PAGES_PER_CATEGORY,
            page_size: PAGE_SIZE,
            page_delay: INTER_PAGE_DELAY,
        }
    }
}

impl SweepConfig {
    pub fn request_count(&self) -> usize {
        self.categories.len() * self.pages_per_category as usize
    }
}

/// Keyword search across the category sweep, merged and deduplicated by title.
pub struct SearchCollector {
    provider: Arc<dyn NewsProvider>,
    cache: NewsCache,
    max_age_hours: u32,
    sweep: SweepConfig,
}

impl SearchCollector {
    pub fn new(provider: Arc<dyn NewsProvider>, cache: NewsCache, max_age_hours: u32, sweep: SweepConfig) -> Self {
        Self {
            provider,
            cache,
            max_age_hours,
            sweep,
        }
    }

    pub fn sweep_config(&self) -> &SweepConfig {
        &self.sweep
    }

    pub async fn collect_search_results(&self, search_term: &str, country: &str) -> Result<Vec<Article>> {
        let key = CacheKey::search(country, search_term);

        if let Some(entry) = self.cache.lookup_fresh(&key, self.max_age_hours).await {
            return Ok(entry.payload);
        }

        let merged = self.sweep(search_term, country).await?;
        let merged_count = merged.len();
        let articles = dedup_by_title(merged);

        if let Err(e) = self.cache.put(&key, &articles).await {
            warn!("Failed to cache search results for {:?}: {}", search_term, e);
        }

        info!(
            "Search {:?} ({}): {} articles, {} after dedup",
            search_term,
            country,
            merged_count,
            articles.len()
        );
        Ok(articles)
    }

    /// Issue every page request strictly in category-then-page order. A
    /// failed page contributes nothing; only a sweep with no successful page
    /// is an error.
    async fn sweep(&self, search_term: &str, country: &str) -> Result<Vec<Article>> {
        let mut merged = Vec::new();
        let mut issued = 0usize;
        let mut succeeded = 0usize;
        let mut last_error = None;

        for category in &self.sweep.categories {
            let label = capitalize(category);

            for page in 1..=self.sweep.pages_per_category {
                if issued > 0 && !self.sweep.page_delay.is_zero() {
                    tokio::time::sleep(self.sweep.page_delay).await;
                }
                issued += 1;

                let query = SearchQuery {
                    term: search_term.to_string(),
                    category: Some(category.clone()),
                    country: country_filter(country).map(|c| c.to_string()),
                    page,
                    page_size: self.sweep.page_size,
                };

                match self.provider.search(&query).await {
                    Ok(articles) => {
                        succeeded += 1;
                        debug!("{} page {}: {} articles", label, page, articles.len());
                        merged.extend(articles.into_iter().map(|a| a.with_category(label.clone())));
                    }
                    Err(e) => {
                        warn!("Search page {} of {} failed for {:?}: {}", page, label, search_term, e);
                        last_error = Some(e);
                    }
                }
            }
        }

        match last_error {
            Some(last) if succeeded == 0 => Err(AggregatorError::SweepFailed {
                requests: issued,
                last: Box::new(last),
            }),
            _ => Ok(merged),
        }
    }
}

/// Keep the first article seen for each title, preserving order.
pub fn dedup_by_title(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.title.clone()))
        .collect()
}

/// Display label for a provider category, e.g. `business` -> `Business`.
pub fn capitalize(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
