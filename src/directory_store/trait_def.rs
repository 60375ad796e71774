//! Storage seam for the tool directory.

use super::models::{
    CategorySummary, DataSource, NewDataSource, NewToolCandidate, SearchSuggestion, TagSummary,
    ToolFilter, ToolRows, ToolStatus, ToolSummary,
};
use anyhow::Result;
use thiserror::Error;

/// Errors for writes that can be refused because of the submitted data,
/// as opposed to the store itself failing.
#[derive(Debug, Error)]
pub enum StoreWriteError {
    #[error("slug already in use: {0}")]
    DuplicateSlug(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown data source: {0}")]
    UnknownSource(i64),
    #[error("data source url already registered: {0}")]
    DuplicateUrl(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Outcome of an admin review decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Applied(ToolSummary),
    NotFound,
    /// Only pending tools can be reviewed; carries the current status.
    NotPending(ToolStatus),
}

pub trait DirectoryStore: Send + Sync {
    /// Cheap round-trip used by the health endpoint.
    fn ping(&self) -> Result<()>;

    // Browsing
    fn find_tools(&self, filter: &ToolFilter) -> Result<ToolRows>;
    fn get_tool(&self, id: &str) -> Result<Option<ToolSummary>>;
    fn get_visible_tool_by_slug(&self, slug: &str) -> Result<Option<ToolSummary>>;
    fn list_categories(&self) -> Result<Vec<CategorySummary>>;
    fn list_tags(&self) -> Result<Vec<TagSummary>>;
    fn suggest(&self, text: &str, limit: usize) -> Result<Vec<SearchSuggestion>>;

    // Favorites, keyed by an opaque client id
    fn is_favorite(&self, owner: &str, tool_id: &str) -> Result<bool>;
    /// Returns true if the favorite did not exist before.
    fn add_favorite(&self, owner: &str, tool_id: &str) -> Result<bool>;
    /// Returns true if a favorite was removed.
    fn remove_favorite(&self, owner: &str, tool_id: &str) -> Result<bool>;
    fn list_favorites(&self, owner: &str) -> Result<Vec<ToolSummary>>;

    // Admin curation
    fn list_data_sources(&self) -> Result<Vec<DataSource>>;
    fn add_data_source(&self, source: &NewDataSource) -> Result<DataSource, StoreWriteError>;
    /// Returns true if a source was deleted.
    fn delete_data_source(&self, id: i64) -> Result<bool>;
    fn insert_candidate(&self, candidate: &NewToolCandidate)
        -> Result<ToolSummary, StoreWriteError>;
    fn review_tool(&self, id: &str, status: ToolStatus) -> Result<StatusTransition>;
}
