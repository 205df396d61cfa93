use crate::traits::NewsProvider;
use crate::types::{AggregatorError, Article, FetchConfig, HeadlinesQuery, Result, SearchQuery};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const HEADLINES_ENDPOINT: &str = "top-headlines";
const SEARCH_ENDPOINT: &str = "everything";
const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP client for the NewsAPI v2 contract.
pub struct Fetcher {
    client: Client,
    base_url: Url,
    config: FetchConfig,
}

/// Envelope shared by both endpoints. Error responses carry `status: "error"`
/// plus `code`/`message` and no `articles`.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    articles: Option<Vec<Article>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        // `Url::join` drops the last path segment unless the base ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    async fn get_articles(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Article>> {
        let url = self.base_url.join(endpoint)?;
        let start_time = Instant::now();

        debug!("Requesting {} with {:?}", url, params);

        // The key travels as a header so it never shows up in the request URL,
        // which reqwest embeds in its error messages.
        let mut request = self.client.get(url.clone()).query(params);
        if !self.config.api_key.is_empty() {
            request = request.header(API_KEY_HEADER, &self.config.api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        let articles = decode_response(status.as_u16(), &body)?;

        info!(
            "Fetched {} articles from {} in {}ms",
            articles.len(),
            url,
            start_time.elapsed().as_millis()
        );
        Ok(articles)
    }
}

#[async_trait]
impl NewsProvider for Fetcher {
    fn provider_name(&self) -> String {
        self.base_url
            .host_str()
            .map(|host| host.to_string())
            .unwrap_or_else(|| "news provider".to_string())
    }

    async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<Vec<Article>> {
        let mut params = Vec::new();
        if let Some(country) = query.country_filter() {
            params.push(("country", country.to_string()));
        }
        if let Some(category) = &query.category {
            params.push(("category", category.clone()));
        }
        self.get_articles(HEADLINES_ENDPOINT, &params).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>> {
        let mut params = vec![("q", query.term.clone())];
        if let Some(category) = &query.category {
            params.push(("category", category.clone()));
        }
        if let Some(country) = &query.country {
            params.push(("country", country.clone()));
        }
        params.push(("page", query.page.to_string()));
        params.push(("pageSize", query.page_size.to_string()));
        self.get_articles(SEARCH_ENDPOINT, &params).await
    }
}

/// Turn a provider response into articles.
///
/// Non-2xx statuses and `"status": "error"` bodies become
/// [`AggregatorError::Provider`]; anything else that does not match the
/// envelope becomes [`AggregatorError::Decode`].
pub fn decode_response(status: u16, body: &str) -> Result<Vec<Article>> {
    let is_success = (200..300).contains(&status);

    if !is_success {
        let message = serde_json::from_str::<ProviderResponse>(body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| reason_phrase(status));
        return Err(AggregatorError::Provider { status, message });
    }

    let response: ProviderResponse = serde_json::from_str(body)
        .map_err(|e| AggregatorError::Decode(format!("Failed to parse provider response: {}", e)))?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .message
            .or(response.code)
            .unwrap_or_else(|| "provider reported an error".to_string());
        return Err(AggregatorError::Provider { status, message });
    }

    response
        .articles
        .ok_or_else(|| AggregatorError::Decode("Provider response has no articles field".to_string()))
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|reason| format!("HTTP {}: {}", status, reason))
        .unwrap_or_else(|| format!("HTTP {}", status))
}
