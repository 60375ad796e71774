//! MCP Directory Server Library
//!
//! Search, filtering and caching for a directory of MCP tool listings, the
//! JSON API serving it and a client for that API.

pub mod client;
pub mod config;
pub mod directory_store;
pub mod search;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use directory_store::{DirectoryStore, SqliteDirectoryStore};
pub use search::{InMemoryQueryCache, NoOpQueryCache, QueryCache};
pub use server::{run_server, RequestsLoggingLevel};
