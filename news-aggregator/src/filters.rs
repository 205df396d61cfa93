use crate::types::Article;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Inclusive publication window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole calendar days: `start` from midnight through the last
    /// millisecond of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let last_millisecond = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(last_millisecond).and_utc(),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Transient narrowing of an already fetched result set. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.sources.is_empty() && self.date_range.is_none()
    }

    /// Category tokens compare case-insensitively against the article's
    /// category, and also against its source name since some provider
    /// results only carry the category in source labelling.
    fn category_matches(&self, article: &Article) -> bool {
        self.categories.is_empty()
            || self.categories.iter().any(|wanted| {
                article
                    .category
                    .as_deref()
                    .is_some_and(|category| category.eq_ignore_ascii_case(wanted))
                    || article.source_name().eq_ignore_ascii_case(wanted)
            })
    }

    /// Source tokens match as case-insensitive substrings of the source name.
    fn source_matches(&self, article: &Article) -> bool {
        if self.sources.is_empty() {
            return true;
        }
        let source_name = article.source_name().to_lowercase();
        self.sources
            .iter()
            .any(|token| source_name.contains(&token.to_lowercase()))
    }

    fn date_matches(&self, article: &Article) -> bool {
        self.date_range
            .map_or(true, |range| range.contains(article.published_at))
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.category_matches(article) && self.source_matches(article) && self.date_matches(article)
    }
}

/// Articles passing `criteria`, in input order. With no criteria set this is
/// the whole input.
pub fn apply_filters(articles: &[Article], criteria: &FilterCriteria) -> Vec<Article> {
    if criteria.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|article| criteria.matches(article))
        .cloned()
        .collect()
}
