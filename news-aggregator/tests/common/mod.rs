#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_aggregator::{AggregatorConfig, Article, HeadlinesQuery, NewsProvider, Result, SearchQuery};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::{watch, Notify};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn published(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
}

pub fn article(title: &str, source: &str) -> Article {
    Article::new(title, source, published(1)).with_url(format!("https://example.com/{}", title.replace(' ', "-")))
}

/// Config with no pacing between search pages.
pub fn fast_config() -> AggregatorConfig {
    let mut config = AggregatorConfig::default();
    config.sweep.page_delay = Duration::ZERO;
    config
}

type HeadlinesFn = Box<dyn Fn(&HeadlinesQuery) -> Result<Vec<Article>> + Send + Sync>;
type SearchFn = Box<dyn Fn(&SearchQuery) -> Result<Vec<Article>> + Send + Sync>;

struct Gate {
    term: String,
    open: watch::Receiver<bool>,
    entered: Arc<Notify>,
}

/// Held by a test to release a gated search term.
pub struct GateHandle {
    open: watch::Sender<bool>,
    pub entered: Arc<Notify>,
}

impl GateHandle {
    pub fn release(&self) {
        let _ = self.open.send(true);
    }
}

/// Provider double that records every request it receives.
pub struct MockProvider {
    headlines: HeadlinesFn,
    search: SearchFn,
    gate: Option<Gate>,
    headline_calls: Mutex<Vec<HeadlinesQuery>>,
    search_calls: Mutex<Vec<SearchQuery>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            headlines: Box::new(|_| Ok(Vec::new())),
            search: Box::new(|_| Ok(Vec::new())),
            gate: None,
            headline_calls: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_headlines<F>(mut self, f: F) -> Self
    where
        F: Fn(&HeadlinesQuery) -> Result<Vec<Article>> + Send + Sync + 'static,
    {
        self.headlines = Box::new(f);
        self
    }

    pub fn with_search<F>(mut self, f: F) -> Self
    where
        F: Fn(&SearchQuery) -> Result<Vec<Article>> + Send + Sync + 'static,
    {
        self.search = Box::new(f);
        self
    }

    /// Requests for `term` block until the returned handle is released.
    pub fn with_gate(mut self, term: &str) -> (Self, GateHandle) {
        let (tx, rx) = watch::channel(false);
        let entered = Arc::new(Notify::new());
        self.gate = Some(Gate {
            term: term.to_string(),
            open: rx,
            entered: entered.clone(),
        });
        (self, GateHandle { open: tx, entered })
    }

    pub fn headline_calls(&self) -> Vec<HeadlinesQuery> {
        self.headline_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchQuery> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.headline_calls.lock().unwrap().len() + self.search_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NewsProvider for MockProvider {
    fn provider_name(&self) -> String {
        "mock".to_string()
    }

    async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<Vec<Article>> {
        self.headline_calls.lock().unwrap().push(query.clone());
        (self.headlines)(query)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>> {
        self.search_calls.lock().unwrap().push(query.clone());

        if let Some(gate) = &self.gate {
            if gate.term == query.term {
                gate.entered.notify_one();
                let mut open = gate.open.clone();
                let _ = open.wait_for(|is_open| *is_open).await;
            }
        }

        (self.search)(query)
    }
}
