use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Country value that disables country scoping on provider requests.
pub const ALL_COUNTRIES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// One news item as returned by the provider. `category` is never part of
/// the provider payload; the search collector fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, source_name: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            source: ArticleSource {
                id: None,
                name: source_name.into(),
            },
            author: None,
            title: title.into(),
            description: None,
            url: String::new(),
            url_to_image: None,
            published_at,
            content: None,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlinesQuery {
    pub country: String,
    pub category: Option<String>,
}

impl HeadlinesQuery {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            category: None,
        }
    }

    /// Country to send to the provider, `None` when scoped to all countries.
    pub fn country_filter(&self) -> Option<&str> {
        country_filter(&self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub category: Option<String>,
    pub country: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

pub fn country_filter(country: &str) -> Option<&str> {
    if country.eq_ignore_ascii_case(ALL_COUNTRIES) {
        None
    } else {
        Some(country)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_key: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://newsapi.org/v2/".to_string(),
            user_agent: "News-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Provider error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("All {requests} search requests failed; last error: {last}")]
    SweepFailed {
        requests: usize,
        last: Box<AggregatorError>,
    },
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
