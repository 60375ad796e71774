//! Runs validated searches against the directory store, behind the query cache.

use super::cache::QueryCache;
use super::cache_key::derive_key;
use super::request::{SearchRequest, SortOrder};
use crate::directory_store::{DirectoryStore, ResultPage, ToolFilter, ToolOrdering, ToolStatus};
use crate::server::metrics;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory storage is unavailable")]
    StorageUnavailable(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_header_value())
    }
}

pub struct QueryExecutor {
    store: Arc<dyn DirectoryStore>,
    cache: Arc<dyn QueryCache>,
    cache_ttl: Duration,
}

impl QueryExecutor {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        cache: Arc<dyn QueryCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Resolves a public search into a storage filter. Only visible tools are
    /// matched, and relevance needs a query to rank against.
    pub fn plan(request: &SearchRequest) -> ToolFilter {
        Self::plan_with_statuses(request, ToolStatus::VISIBLE)
    }

    fn plan_with_statuses(request: &SearchRequest, statuses: &[ToolStatus]) -> ToolFilter {
        let ordering = match (request.sort, &request.query) {
            (SortOrder::Popular, _) => ToolOrdering::PopularityDesc,
            (SortOrder::Relevance, Some(_)) => ToolOrdering::RelevanceDesc,
            _ => ToolOrdering::CreatedDesc,
        };
        ToolFilter {
            statuses: statuses.to_vec(),
            text: request.query.clone(),
            category_slug: request.category_slug.clone(),
            tag_slugs: request.tag_slugs.iter().cloned().collect(),
            ordering,
            limit: request.page_size,
            offset: request.offset(),
        }
    }

    /// Public tool search. Pages are served from the cache when possible and
    /// cached after a miss.
    pub fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<(ResultPage, CacheStatus), DirectoryError> {
        let key = derive_key(request);

        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<ResultPage>(&cached) {
                Ok(page) => {
                    debug!("Query cache hit for {}", key);
                    metrics::record_cache_lookup(true);
                    return Ok((page, CacheStatus::Hit));
                }
                Err(err) => warn!("Discarding unreadable cache entry {}: {}", key, err),
            }
        }
        metrics::record_cache_lookup(false);

        let page = self.run(request, &Self::plan(request))?;
        match serde_json::to_string(&page) {
            Ok(serialized) => self.cache.set(&key, serialized, self.cache_ttl),
            Err(err) => warn!("Could not serialize result page for {}: {}", key, err),
        }
        Ok((page, CacheStatus::Miss))
    }

    /// Uncached search restricted to the given statuses, for back-office
    /// listings.
    pub fn search_with_statuses(
        &self,
        request: &SearchRequest,
        statuses: &[ToolStatus],
    ) -> Result<ResultPage, DirectoryError> {
        self.run(request, &Self::plan_with_statuses(request, statuses))
    }

    /// Drops every cached page.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn run(&self, request: &SearchRequest, filter: &ToolFilter) -> Result<ResultPage, DirectoryError> {
        let start = Instant::now();
        let rows = self
            .store
            .find_tools(filter)
            .map_err(DirectoryError::StorageUnavailable)?;
        metrics::record_db_query("find_tools", start.elapsed());

        Ok(ResultPage {
            items: rows.items,
            total: rows.total,
            page: request.page,
            page_size: request.page_size,
        })
    }
}
