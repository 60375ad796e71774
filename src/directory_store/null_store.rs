//! Null directory store implementation.
//!
//! Stands in for a database that cannot be reached: every call fails. Used to
//! exercise the unavailable-storage paths of the HTTP layer.

use super::models::{
    CategorySummary, DataSource, NewDataSource, NewToolCandidate, SearchSuggestion, TagSummary,
    ToolFilter, ToolRows, ToolStatus, ToolSummary,
};
use super::trait_def::{DirectoryStore, StatusTransition, StoreWriteError};
use anyhow::{anyhow, Result};

pub struct NullDirectoryStore;

fn unreachable_store<T>() -> Result<T> {
    Err(anyhow!("directory database is not reachable"))
}

impl DirectoryStore for NullDirectoryStore {
    fn ping(&self) -> Result<()> {
        unreachable_store()
    }

    fn find_tools(&self, _filter: &ToolFilter) -> Result<ToolRows> {
        unreachable_store()
    }

    fn get_tool(&self, _id: &str) -> Result<Option<ToolSummary>> {
        unreachable_store()
    }

    fn get_visible_tool_by_slug(&self, _slug: &str) -> Result<Option<ToolSummary>> {
        unreachable_store()
    }

    fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        unreachable_store()
    }

    fn list_tags(&self) -> Result<Vec<TagSummary>> {
        unreachable_store()
    }

    fn suggest(&self, _text: &str, _limit: usize) -> Result<Vec<SearchSuggestion>> {
        unreachable_store()
    }

    fn is_favorite(&self, _owner: &str, _tool_id: &str) -> Result<bool> {
        unreachable_store()
    }

    fn add_favorite(&self, _owner: &str, _tool_id: &str) -> Result<bool> {
        unreachable_store()
    }

    fn remove_favorite(&self, _owner: &str, _tool_id: &str) -> Result<bool> {
        unreachable_store()
    }

    fn list_favorites(&self, _owner: &str) -> Result<Vec<ToolSummary>> {
        unreachable_store()
    }

    fn list_data_sources(&self) -> Result<Vec<DataSource>> {
        unreachable_store()
    }

    fn add_data_source(&self, _source: &NewDataSource) -> Result<DataSource, StoreWriteError> {
        Ok(unreachable_store()?)
    }

    fn delete_data_source(&self, _id: i64) -> Result<bool> {
        unreachable_store()
    }

    fn insert_candidate(
        &self,
        _candidate: &NewToolCandidate,
    ) -> Result<ToolSummary, StoreWriteError> {
        Err(StoreWriteError::Other(anyhow!(
            "directory database is not reachable"
        )))
    }

    fn review_tool(&self, _id: &str, _status: ToolStatus) -> Result<StatusTransition> {
        unreachable_store()
    }
}
