mod cache;
mod cache_key;
mod executor;
mod request;

pub use cache::{InMemoryQueryCache, NoOpQueryCache, QueryCache};
pub use cache_key::derive_key;
pub use executor::{CacheStatus, DirectoryError, QueryExecutor};
pub use request::{
    is_valid_slug, parse_search_request, FieldError, SearchRequest, SortOrder, ValidationErrors,
    MAX_QUERY_CHARS,
};
