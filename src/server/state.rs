use axum::extract::FromRef;

use crate::directory_store::DirectoryStore;
use crate::search::QueryExecutor;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedDirectoryStore = Arc<dyn DirectoryStore>;
pub type GuardedQueryExecutor = Arc<QueryExecutor>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedDirectoryStore,
    pub executor: GuardedQueryExecutor,
    pub version: String,
}

impl FromRef<ServerState> for GuardedDirectoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedQueryExecutor {
    fn from_ref(input: &ServerState) -> Self {
        input.executor.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
