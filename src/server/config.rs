use super::RequestsLoggingLevel;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub query_cache_ttl_sec: u64,
    pub query_cache_max_entries: usize,
    pub frontend_dir_path: Option<String>,
    /// Admin routes are only mounted when a token is set.
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            query_cache_ttl_sec: 60,
            query_cache_max_entries: 1000,
            frontend_dir_path: None,
            admin_token: None,
        }
    }
}
