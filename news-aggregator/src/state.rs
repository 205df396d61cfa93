use crate::preferences::Preferences;
use crate::types::Article;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

pub const DEFAULT_COUNTRY: &str = "us";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchStatus::Idle => "idle",
            FetchStatus::Loading => "loading",
            FetchStatus::Succeeded => "succeeded",
            FetchStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Everything presentation layers read. Only [`reduce`] changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateState {
    pub news: Vec<Article>,
    pub search_results: Vec<Article>,
    pub status: FetchStatus,
    pub search_status: FetchStatus,
    pub error: Option<String>,
    pub search_error: Option<String>,
    pub current_country: String,
    pub preferences: Preferences,
    pub search_term: Option<String>,
    /// Generation of the latest headline request; older completions are dropped.
    pub headlines_generation: u64,
    /// Generation of the latest search request or clear.
    pub search_generation: u64,
}

impl Default for AggregateState {
    fn default() -> Self {
        Self {
            news: Vec::new(),
            search_results: Vec::new(),
            status: FetchStatus::Idle,
            search_status: FetchStatus::Idle,
            error: None,
            search_error: None,
            current_country: DEFAULT_COUNTRY.to_string(),
            preferences: Preferences::default(),
            search_term: None,
            headlines_generation: 0,
            search_generation: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    HeadlinesRequested,
    HeadlinesSucceeded { generation: u64, articles: Vec<Article> },
    HeadlinesFailed { generation: u64, message: String },
    SearchRequested { term: String },
    SearchSucceeded { generation: u64, articles: Vec<Article> },
    SearchFailed { generation: u64, message: String },
    SearchCleared,
    CurrentCountrySet(String),
    PreferencesSet(Preferences),
    PreferencesCleared,
}

/// Which slot an applied event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Headlines,
    Search,
    CurrentCountry,
    Preferences,
}

impl StateEvent {
    pub fn change(&self) -> StateChange {
        match self {
            StateEvent::HeadlinesRequested
            | StateEvent::HeadlinesSucceeded { .. }
            | StateEvent::HeadlinesFailed { .. } => StateChange::Headlines,
            StateEvent::SearchRequested { .. }
            | StateEvent::SearchSucceeded { .. }
            | StateEvent::SearchFailed { .. }
            | StateEvent::SearchCleared => StateChange::Search,
            StateEvent::CurrentCountrySet(_) => StateChange::CurrentCountry,
            StateEvent::PreferencesSet(_) | StateEvent::PreferencesCleared => StateChange::Preferences,
        }
    }

    /// Whether applying this event to `state` would change anything. Only
    /// completions from superseded requests are dropped.
    pub fn applies_to(&self, state: &AggregateState) -> bool {
        match self {
            StateEvent::HeadlinesSucceeded { generation, .. } | StateEvent::HeadlinesFailed { generation, .. } => {
                *generation == state.headlines_generation
            }
            StateEvent::SearchSucceeded { generation, .. } | StateEvent::SearchFailed { generation, .. } => {
                *generation == state.search_generation
            }
            _ => true,
        }
    }
}

/// Pure transition function.
///
/// Failures keep the previous data slot so the last good results stay
/// visible; only the status and error slots change.
pub fn reduce(mut state: AggregateState, event: StateEvent) -> AggregateState {
    if !event.applies_to(&state) {
        return state;
    }

    match event {
        StateEvent::HeadlinesRequested => {
            state.headlines_generation += 1;
            state.status = FetchStatus::Loading;
        }
        StateEvent::HeadlinesSucceeded { articles, .. } => {
            state.status = FetchStatus::Succeeded;
            state.news = articles;
            state.error = None;
        }
        StateEvent::HeadlinesFailed { message, .. } => {
            state.status = FetchStatus::Failed;
            state.error = Some(message);
        }
        StateEvent::SearchRequested { term } => {
            state.search_generation += 1;
            state.search_status = FetchStatus::Loading;
            state.search_term = Some(term);
        }
        StateEvent::SearchSucceeded { articles, .. } => {
            state.search_status = FetchStatus::Succeeded;
            state.search_results = articles;
            state.search_error = None;
        }
        StateEvent::SearchFailed { message, .. } => {
            state.search_status = FetchStatus::Failed;
            state.search_error = Some(message);
        }
        StateEvent::SearchCleared => {
            // Bumped so a search still in flight cannot repopulate the slot.
            state.search_generation += 1;
            state.search_results = Vec::new();
            state.search_status = FetchStatus::Idle;
            state.search_error = None;
            state.search_term = None;
        }
        StateEvent::CurrentCountrySet(country) => {
            state.current_country = country;
        }
        StateEvent::PreferencesSet(preferences) => {
            state.preferences = preferences;
        }
        StateEvent::PreferencesCleared => {
            state.preferences = Preferences::default();
        }
    }

    state
}

/// Process-wide holder of [`AggregateState`] with change notifications.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<RwLock<AggregateState>>,
    notifier: broadcast::Sender<StateChange>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AggregateState::default())
    }
}

impl StateStore {
    pub fn new(initial: AggregateState) -> Self {
        let (notifier, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(initial)),
            notifier,
        }
    }

    /// Apply `event` and return the resulting state. Subscribers are told
    /// about every event that was not dropped as stale.
    pub async fn dispatch(&self, event: StateEvent) -> AggregateState {
        let change = event.change();
        let mut guard = self.state.write().await;

        if !event.applies_to(&guard) {
            debug!("Dropping stale {:?} event", change);
            return guard.clone();
        }

        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, event);
        let snapshot = guard.clone();
        drop(guard);

        // No subscribers is fine.
        let _ = self.notifier.send(change);
        snapshot
    }

    pub async fn snapshot(&self) -> AggregateState {
        self.state.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.notifier.subscribe()
    }
}
