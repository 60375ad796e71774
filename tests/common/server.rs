//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own directory database.

use super::constants::*;
use super::fixtures::create_test_directory;
use mcp_directory_server::directory_store::{DirectoryStore, SqliteDirectoryStore};
use mcp_directory_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use mcp_directory_server::InMemoryQueryCache;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Store for direct database access in tests
    pub store: Arc<SqliteDirectoryStore>,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, with admin routes enabled.
    ///
    /// # Panics
    ///
    /// Panics if seeding, binding or startup fails.
    pub async fn spawn() -> Self {
        Self::spawn_with_admin_token(Some(ADMIN_TOKEN.to_string())).await
    }

    pub async fn spawn_with_admin_token(admin_token: Option<String>) -> Self {
        let (temp_db_dir, db_path) =
            create_test_directory().expect("Failed to create test directory");
        let store = Arc::new(SqliteDirectoryStore::new(&db_path).expect("Failed to open store"));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            admin_token,
            ..Default::default()
        };
        let cache = Arc::new(InMemoryQueryCache::new(config.query_cache_max_entries));

        let app = make_app(config, store.clone(), cache).expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Id of a seeded visible tool.
    pub fn tool_id(&self, slug: &str) -> String {
        self.store
            .get_visible_tool_by_slug(slug)
            .expect("Store failed")
            .unwrap_or_else(|| panic!("No visible tool {}", slug))
            .id
    }

    /// Waits for the server to become ready by polling the home route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
