use crate::cache::NewsCache;
use crate::config::AggregatorConfig;
use crate::filters::{apply_filters, FilterCriteria};
use crate::headlines::HeadlineFetcher;
use crate::preferences::{apply_preferences, PreferenceStore, Preferences};
use crate::search::SearchCollector;
use crate::state::{AggregateState, StateChange, StateEvent, StateStore};
use crate::traits::NewsProvider;
use crate::types::{AggregatorError, Article, Result};
use interfaces::KeyValueStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// The fetch, cache, aggregate and filter pipeline behind one state store.
pub struct NewsAggregator {
    headlines: HeadlineFetcher,
    collector: SearchCollector,
    preferences: PreferenceStore,
    state: StateStore,
}

impl NewsAggregator {
    pub fn new(provider: Arc<dyn NewsProvider>, store: Arc<dyn KeyValueStore>, config: AggregatorConfig) -> Self {
        let cache = NewsCache::new(store.clone());
        let headlines = HeadlineFetcher::new(provider.clone(), cache.clone(), config.max_age_hours);
        let collector = SearchCollector::new(provider, cache, config.max_age_hours, config.sweep);

        Self {
            headlines,
            collector,
            preferences: PreferenceStore::new(store),
            state: StateStore::default(),
        }
    }

    /// Hydrate the state's preferences from the substrate.
    pub async fn load_preferences(&self) -> Preferences {
        let preferences = self.preferences.load().await;
        self.state
            .dispatch(StateEvent::PreferencesSet(preferences.clone()))
            .await;
        preferences
    }

    pub async fn fetch_headlines(&self, country: &str) -> Result<Vec<Article>> {
        let generation = self
            .state
            .dispatch(StateEvent::HeadlinesRequested)
            .await
            .headlines_generation;

        match self.headlines.fetch_headlines(country).await {
            Ok(articles) => {
                self.state
                    .dispatch(StateEvent::HeadlinesSucceeded {
                        generation,
                        articles: articles.clone(),
                    })
                    .await;
                Ok(articles)
            }
            Err(e) => {
                error!("Headline fetch for {} failed: {}", country, e);
                self.state
                    .dispatch(StateEvent::HeadlinesFailed {
                        generation,
                        message: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// Headlines for the state's current country.
    pub async fn refresh_headlines(&self) -> Result<Vec<Article>> {
        let country = self.state.snapshot().await.current_country;
        self.fetch_headlines(&country).await
    }

    /// Clear the search slot and run a keyword search. If a newer search is
    /// started before this one resolves, this one's outcome is returned to
    /// the caller but never written to the state.
    pub async fn search(&self, term: &str, country: &str) -> Result<Vec<Article>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AggregatorError::InvalidQuery("search term is empty".to_string()));
        }

        self.state.dispatch(StateEvent::SearchCleared).await;
        let generation = self
            .state
            .dispatch(StateEvent::SearchRequested { term: term.to_string() })
            .await
            .search_generation;

        let outcome = self.collector.collect_search_results(term, country).await;

        match outcome {
            Ok(articles) => {
                self.state
                    .dispatch(StateEvent::SearchSucceeded {
                        generation,
                        articles: articles.clone(),
                    })
                    .await;
                Ok(articles)
            }
            Err(e) => {
                error!("Search {:?} failed: {}", term, e);
                self.state
                    .dispatch(StateEvent::SearchFailed {
                        generation,
                        message: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    pub async fn clear_search(&self) {
        self.state.dispatch(StateEvent::SearchCleared).await;
    }

    pub async fn set_current_country(&self, country: &str) {
        self.state
            .dispatch(StateEvent::CurrentCountrySet(country.to_string()))
            .await;
    }

    pub async fn set_preferences(&self, preferences: Preferences) -> Result<()> {
        self.preferences.save(&preferences).await?;
        self.state.dispatch(StateEvent::PreferencesSet(preferences)).await;
        Ok(())
    }

    pub async fn clear_preferences(&self) -> Result<()> {
        self.preferences.clear().await?;
        self.state.dispatch(StateEvent::PreferencesCleared).await;
        info!("Preferences reset");
        Ok(())
    }

    pub async fn state(&self) -> AggregateState {
        self.state.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    /// Current headlines narrowed by the stored preferences.
    pub async fn preferred_headlines(&self) -> Vec<Article> {
        let state = self.state.snapshot().await;
        apply_preferences(&state.news, &state.preferences)
    }

    /// Current search results narrowed by the stored preferences.
    pub async fn preferred_search_results(&self) -> Vec<Article> {
        let state = self.state.snapshot().await;
        apply_preferences(&state.search_results, &state.preferences)
    }

    /// Current search results narrowed by ad-hoc criteria.
    pub async fn filtered_search_results(&self, criteria: &FilterCriteria) -> Vec<Article> {
        let state = self.state.snapshot().await;
        apply_filters(&state.search_results, criteria)
    }
}
