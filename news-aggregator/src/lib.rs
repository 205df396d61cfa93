pub mod types;
pub mod traits;
pub mod fetcher;
pub mod freshness;
pub mod cache;
pub mod headlines;
pub mod search;
pub mod preferences;
pub mod filters;
pub mod state;
pub mod config;
pub mod aggregator;

pub use types::*;
pub use traits::NewsProvider;
pub use fetcher::Fetcher;
pub use cache::{CacheEntry, CacheKey, NewsCache};
pub use headlines::HeadlineFetcher;
pub use search::{SearchCollector, SweepConfig};
pub use preferences::{apply_preferences, PreferenceStore, Preferences};
pub use filters::{apply_filters, DateRange, FilterCriteria};
pub use state::{reduce, AggregateState, FetchStatus, StateChange, StateEvent, StateStore};
pub use config::AggregatorConfig;
pub use aggregator::NewsAggregator;
