//! Client side of the directory API: an HTTP client plus the state machines
//! behind the search suggestions box and the favorite button.

mod api;
#[cfg(test)]
mod fake_api;
mod favorite;
mod suggestions;

pub use api::{ClientError, DirectoryApi, HttpDirectoryClient};
pub use favorite::{FavoriteState, FavoriteToggle, ToggleOutcome, TogglePhase};
pub use suggestions::{FetchPhase, SuggestionFetcher, SuggestionState, SUGGESTION_DEBOUNCE};
