//! Favorite/unfavorite state for a single tool.

use super::api::{ClientError, DirectoryApi};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Loading,
    Ready,
    Toggling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteState {
    pub phase: TogglePhase,
    pub is_favorited: bool,
    pub error: Option<String>,
}

impl FavoriteState {
    pub fn is_loading(&self) -> bool {
        self.phase != TogglePhase::Ready
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Another load or toggle was in flight, nothing was sent.
    Ignored,
    /// The server accepted the change; carries the new favorite flag.
    Toggled(bool),
}

/// Puts a toggle back to `Ready` when its request future is dropped before
/// the server answered. The flag is left as it was.
struct PendingToggle<'a> {
    state: &'a watch::Sender<FavoriteState>,
    settled: bool,
}

impl PendingToggle<'_> {
    fn settle(mut self, was_favorited: bool, result: &Result<(), ClientError>) {
        self.settled = true;
        self.state.send_modify(|s| {
            s.phase = TogglePhase::Ready;
            match result {
                Ok(()) => s.is_favorited = !was_favorited,
                Err(err) => s.error = Some(err.to_string()),
            }
        });
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Favorite toggle abandoned before completion");
            self.state.send_modify(|s| s.phase = TogglePhase::Ready);
        }
    }
}

/// The flag only flips once the server call has succeeded. A toggle issued
/// while the initial load or a previous toggle is pending is ignored.
pub struct FavoriteToggle {
    api: Arc<dyn DirectoryApi>,
    tool_id: String,
    state: watch::Sender<FavoriteState>,
}

impl FavoriteToggle {
    pub fn new(api: Arc<dyn DirectoryApi>, tool_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(FavoriteState {
            phase: TogglePhase::Loading,
            is_favorited: false,
            error: None,
        });
        Self {
            api,
            tool_id: tool_id.into(),
            state,
        }
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn state(&self) -> FavoriteState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoriteState> {
        self.state.subscribe()
    }

    /// Initial fetch of the favorite flag. On failure the toggle becomes
    /// ready as not favorited, with the error kept in state.
    pub async fn load(&self) -> Result<bool, ClientError> {
        let result = self.api.is_favorited(&self.tool_id).await;
        self.state.send_modify(|s| {
            s.phase = TogglePhase::Ready;
            match &result {
                Ok(is_favorited) => {
                    s.is_favorited = *is_favorited;
                    s.error = None;
                }
                Err(err) => {
                    s.is_favorited = false;
                    s.error = Some(err.to_string());
                }
            }
        });
        result
    }

    pub async fn toggle(&self) -> Result<ToggleOutcome, ClientError> {
        let mut was_favorited = false;
        let started = self.state.send_if_modified(|s| {
            if s.phase != TogglePhase::Ready {
                return false;
            }
            was_favorited = s.is_favorited;
            s.phase = TogglePhase::Toggling;
            s.error = None;
            true
        });
        if !started {
            return Ok(ToggleOutcome::Ignored);
        }
        let pending = PendingToggle {
            state: &self.state,
            settled: false,
        };

        let result = if was_favorited {
            self.api.remove_favorite(&self.tool_id).await
        } else {
            self.api.add_favorite(&self.tool_id).await
        };
        pending.settle(was_favorited, &result);

        match result {
            Ok(()) => Ok(ToggleOutcome::Toggled(!was_favorited)),
            Err(err) => {
                warn!("Favorite toggle for {} failed: {}", self.tool_id, err);
                Err(err)
            }
        }
    }
}
