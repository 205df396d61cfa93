use crate::freshness::DEFAULT_MAX_AGE_HOURS;
use crate::search::SweepConfig;
use crate::types::FetchConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const API_KEY_VAR: &str = "NEWS_API_KEY";
pub const BASE_URL_VAR: &str = "NEWS_API_BASE_URL";
pub const MAX_AGE_HOURS_VAR: &str = "NEWS_CACHE_MAX_AGE_HOURS";
pub const PAGE_DELAY_MS_VAR: &str = "NEWS_SEARCH_PAGE_DELAY_MS";
pub const DATABASE_VAR: &str = "NEWS_CACHE_DATABASE";

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub fetch: FetchConfig,
    pub sweep: SweepConfig,
    pub max_age_hours: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            sweep: SweepConfig::default(),
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }
}

impl AggregatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their
    /// defaults and unparsable numbers are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_key) = lookup(API_KEY_VAR) {
            config.fetch.api_key = api_key;
        }
        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config.fetch.base_url = base_url;
        }
        if let Some(hours) = parse_var(&lookup, MAX_AGE_HOURS_VAR) {
            config.max_age_hours = hours;
        }
        if let Some(delay_ms) = parse_var::<u64, _>(&lookup, PAGE_DELAY_MS_VAR) {
            config.sweep.page_delay = Duration::from_millis(delay_ms);
        }

        config
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
