//! In-process [`DirectoryApi`] used by the widget tests.

use super::api::{ClientError, DirectoryApi};
use crate::directory_store::{SearchSuggestion, SuggestionKind};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeDirectoryApi {
    pub suggestion_calls: Mutex<Vec<String>>,
    pub post_calls: Mutex<Vec<String>>,
    pub delete_calls: Mutex<Vec<String>>,
    favorites: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Duration,
    failing: AtomicBool,
}

impl FakeDirectoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Default::default()
        }
    }

    pub fn delay_query(&self, query: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(query.to_string(), delay);
    }

    pub fn favorite(&self, tool_id: &str) {
        self.favorites.lock().unwrap().insert(tool_id.to_string());
    }

    pub fn suggestion_calls(&self) -> Vec<String> {
        self.suggestion_calls.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.post_calls.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.delete_calls.lock().unwrap().len()
    }

    async fn pause(&self, key: &str) {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 503,
                code: "STORAGE_UNAVAILABLE".to_string(),
                message: "Storage is temporarily unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryApi for FakeDirectoryApi {
    async fn suggestions(&self, query: &str) -> Result<Vec<SearchSuggestion>, ClientError> {
        self.suggestion_calls
            .lock()
            .unwrap()
            .push(query.to_string());
        self.pause(query).await;
        self.check()?;
        Ok(vec![SearchSuggestion {
            kind: SuggestionKind::Tool,
            slug: format!("{}-tool", query),
            label: format!("{} tool", query),
        }])
    }

    async fn is_favorited(&self, tool_id: &str) -> Result<bool, ClientError> {
        self.pause(tool_id).await;
        self.check()?;
        Ok(self.favorites.lock().unwrap().contains(tool_id))
    }

    async fn add_favorite(&self, tool_id: &str) -> Result<(), ClientError> {
        self.post_calls.lock().unwrap().push(tool_id.to_string());
        self.pause(tool_id).await;
        self.check()?;
        self.favorites.lock().unwrap().insert(tool_id.to_string());
        Ok(())
    }

    async fn remove_favorite(&self, tool_id: &str) -> Result<(), ClientError> {
        self.delete_calls.lock().unwrap().push(tool_id.to_string());
        self.pause(tool_id).await;
        self.check()?;
        self.favorites.lock().unwrap().remove(tool_id);
        Ok(())
    }
}
