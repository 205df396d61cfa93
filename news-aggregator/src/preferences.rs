use crate::types::{Article, Result};
use interfaces::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Substrate key holding the serialized preferences.
pub const PREFERENCES_KEY: &str = "newsPreferences";

/// Durable user-level content filters. An empty set places no constraint on
/// its field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub authors: BTreeSet<String>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.sources.is_empty() && self.authors.is_empty()
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// All three constraints must hold. A missing category or author never
    /// satisfies a non-empty constraint.
    pub fn matches(&self, article: &Article) -> bool {
        constraint_holds(&self.categories, article.category.as_deref())
            && constraint_holds(&self.sources, Some(article.source_name()))
            && constraint_holds(&self.authors, article.author.as_deref())
    }
}

fn constraint_holds(allowed: &BTreeSet<String>, value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}

/// Articles passing `preferences`, in input order. The input is not modified.
pub fn apply_preferences(articles: &[Article], preferences: &Preferences) -> Vec<Article> {
    articles
        .iter()
        .filter(|article| preferences.matches(article))
        .cloned()
        .collect()
}

/// Loads and saves [`Preferences`] alongside the article cache.
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored preferences, or the empty default when absent or unreadable.
    pub async fn load(&self) -> Preferences {
        match self.store.get(PREFERENCES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(preferences) => preferences,
                Err(e) => {
                    warn!("Ignoring malformed stored preferences: {}", e);
                    Preferences::default()
                }
            },
            Ok(None) => {
                debug!("No stored preferences");
                Preferences::default()
            }
            Err(e) => {
                warn!("Failed to read stored preferences: {}", e);
                Preferences::default()
            }
        }
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<()> {
        let serialized = serde_json::to_string(preferences)?;
        self.store.set(PREFERENCES_KEY, &serialized).await?;
        info!(
            "Saved preferences ({} categories, {} sources, {} authors)",
            preferences.categories.len(),
            preferences.sources.len(),
            preferences.authors.len()
        );
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(PREFERENCES_KEY).await?;
        info!("Cleared stored preferences");
        Ok(())
    }
}
