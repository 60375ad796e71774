//! Debounced search suggestions for an input field.
//!
//! Each keystroke goes through [`SuggestionFetcher::on_input`]. Calls are
//! made after [`SUGGESTION_DEBOUNCE`] of inactivity, and every scheduled call
//! carries a sequence number: a response is applied only while its number is
//! still the latest, so a slow answer for an old query never replaces the
//! suggestions of the current one.

use super::api::DirectoryApi;
use crate::directory_store::SearchSuggestion;
use crate::server::MIN_SUGGESTION_QUERY_GRAPHEMES;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

pub const SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Debouncing,
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionState {
    pub phase: FetchPhase,
    /// Query the current suggestions (or error) belong to.
    pub query: String,
    pub suggestions: Vec<SearchSuggestion>,
    pub error: Option<String>,
}

impl Default for SuggestionState {
    fn default() -> Self {
        Self {
            phase: FetchPhase::Idle,
            query: String::new(),
            suggestions: Vec::new(),
            error: None,
        }
    }
}

pub struct SuggestionFetcher {
    api: Arc<dyn DirectoryApi>,
    debounce: Duration,
    latest_seq: Arc<AtomicU64>,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl SuggestionFetcher {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        Self::with_debounce(api, SUGGESTION_DEBOUNCE)
    }

    pub fn with_debounce(api: Arc<dyn DirectoryApi>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SuggestionState::default());
        Self {
            api,
            debounce,
            latest_seq: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    /// Registers a new value of the input. Must be called from within a
    /// tokio runtime.
    pub fn on_input(&self, raw_query: &str) {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = raw_query.trim().to_string();

        if query.graphemes(true).count() < MIN_SUGGESTION_QUERY_GRAPHEMES {
            self.state.send_modify(|state| {
                *state = SuggestionState {
                    query,
                    ..Default::default()
                }
            });
            return;
        }

        self.state.send_modify(|state| {
            state.phase = FetchPhase::Debouncing;
            state.query = query.clone();
        });

        let api = self.api.clone();
        let latest_seq = self.latest_seq.clone();
        let state = self.state.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest_seq.load(Ordering::SeqCst) != seq {
                return;
            }
            state.send_modify(|s| s.phase = FetchPhase::Fetching);

            let result = api.suggestions(&query).await;
            if latest_seq.load(Ordering::SeqCst) != seq {
                debug!("Discarding stale suggestions for {:?}", query);
                return;
            }

            state.send_modify(|s| {
                s.phase = FetchPhase::Idle;
                match result {
                    Ok(suggestions) => {
                        s.suggestions = suggestions;
                        s.error = None;
                    }
                    Err(err) => {
                        s.suggestions.clear();
                        s.error = Some(err.to_string());
                    }
                }
            });
        });
    }
}
