use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    admin_routes::make_admin_routes,
    assign_request_id,
    envelope::{ApiError, RequestContext},
    favorites_routes::make_favorites_routes,
    http_cache, log_requests, metrics,
    state::*,
    tools_routes::make_tools_routes,
    CachePolicy, ServerConfig,
};
use crate::directory_store::DirectoryStore;
use crate::search::{QueryCache, QueryExecutor};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    pub database: DatabaseState,
    /// Seconds since the server started.
    pub uptime: u64,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
    };
    Json(stats)
}

async fn health(ctx: RequestContext, State(state): State<ServerState>) -> Response {
    let ping = state.store.ping();
    let status = HealthStatus {
        status: if ping.is_ok() {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        },
        database: if ping.is_ok() {
            DatabaseState::Up
        } else {
            DatabaseState::Down
        },
        uptime: state.start_time.elapsed().as_secs(),
        version: state.version.clone(),
    };

    match ping {
        Ok(()) => ctx.ok(status),
        Err(err) => ctx.fail_with_data(ApiError::StorageUnavailable(err), Some(status)),
    }
}

async fn not_found(ctx: RequestContext) -> Response {
    ctx.fail(ApiError::NotFound("No such endpoint".to_string()))
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn DirectoryStore>,
    cache: Arc<dyn QueryCache>,
) -> Result<Router> {
    let executor = Arc::new(QueryExecutor::new(
        store.clone(),
        cache,
        Duration::from_secs(config.query_cache_ttl_sec),
    ));
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        store,
        executor,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let health_routes: Router = Router::new()
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(
            CachePolicy::NoStore,
            http_cache,
        ))
        .with_state(state.clone());

    let mut api_routes: Router = Router::new()
        .merge(make_tools_routes(state.clone()))
        .merge(make_favorites_routes(state.clone()))
        .merge(health_routes);

    if let Some(admin_routes) = make_admin_routes(state.clone()) {
        info!("Admin routes enabled");
        api_routes = api_routes.nest("/admin", admin_routes);
    }
    let api_routes = api_routes.fallback(not_found);

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .fallback(not_found)
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.nest("/api", api_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));
    app = app.layer(middleware::from_fn(assign_request_id));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn DirectoryStore>,
    cache: Arc<dyn QueryCache>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, store, cache)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    tokio::select! {
        result = async { axum::serve(listener, app).await } => Ok(result?),
        result = async { axum::serve(metrics_listener, make_metrics_app()).await } => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory_store::{NewToolCandidate, NullDirectoryStore, SqliteDirectoryStore, ToolStatus};
    use crate::search::{InMemoryQueryCache, NoOpQueryCache};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    const ADMIN_TOKEN: &str = "let-me-in";

    fn test_config() -> ServerConfig {
        ServerConfig {
            requests_logging_level: super::super::RequestsLoggingLevel::None,
            admin_token: Some(ADMIN_TOKEN.to_string()),
            ..ServerConfig::default()
        }
    }

    fn seeded_store() -> Arc<SqliteDirectoryStore> {
        let store = SqliteDirectoryStore::in_memory().unwrap();
        store.upsert_category("databases", "Databases", "").unwrap();
        let created = store
            .insert_candidate(&NewToolCandidate {
                slug: "postgres".to_string(),
                name: "Postgres MCP".to_string(),
                description: "Query postgres".to_string(),
                category_slug: Some("databases".to_string()),
                tag_slugs: vec!["sql".to_string()],
                source_id: None,
            })
            .unwrap();
        store.review_tool(&created.id, ToolStatus::Published).unwrap();
        Arc::new(store)
    }

    fn app_with(store: Arc<dyn DirectoryStore>) -> Router {
        make_app(test_config(), store, Arc::new(InMemoryQueryCache::new(16))).unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (Response, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (Response::from_parts(parts, Body::empty()), json)
    }

    #[tokio::test]
    async fn every_response_carries_a_request_id() {
        let app = app_with(seeded_store());
        for uri in ["/api/tools", "/api/nope", "/api/tools?page=0"] {
            let (response, json) = get_json(&app, uri).await;
            let header = response
                .headers()
                .get("X-Request-ID")
                .expect("missing request id")
                .to_str()
                .unwrap()
                .to_string();
            assert_eq!(json["meta"]["requestId"], header.as_str(), "uri {}", uri);
        }
    }

    #[tokio::test]
    async fn tools_search_reports_cache_status() {
        let app = app_with(seeded_store());

        let (response, json) = get_json(&app, "/api/tools?q=postgres").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["X-Cache"], "MISS");
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["items"][0]["slug"], "postgres");

        let (response, _) = get_json(&app, "/api/tools?q=postgres").await;
        assert_eq!(response.headers()["X-Cache"], "HIT");
    }

    #[tokio::test]
    async fn invalid_parameters_are_reported_together() {
        let app = app_with(seeded_store());
        let (response, json) = get_json(&app, "/api/tools?page=0&pageSize=101").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "INVALID_PARAMETER");
        assert_eq!(json["error"]["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn taxonomy_routes_set_cache_headers() {
        let app = app_with(seeded_store());
        let (response, json) = get_json(&app, "/api/categories").await;
        assert_eq!(response.headers()["Cache-Control"], "public, s-maxage=3600");
        assert_eq!(json["data"][0]["toolCount"], 1);

        let (response, _) = get_json(&app, "/api/tags").await;
        assert_eq!(response.headers()["Cache-Control"], "public, s-maxage=1800");
    }

    #[tokio::test]
    async fn health_reports_unavailable_storage() {
        let app = make_app(
            test_config(),
            Arc::new(NullDirectoryStore),
            Arc::new(NoOpQueryCache),
        )
        .unwrap();
        let (response, json) = get_json(&app, "/api/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers()["Cache-Control"],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["database"], "down");
        assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");

        let (response, json) = get_json(&app, "/api/tools").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn healthy_storage() {
        let app = app_with(seeded_store());
        let (response, json) = get_json(&app, "/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn short_suggestion_queries_do_not_touch_storage() {
        let app = make_app(
            test_config(),
            Arc::new(NullDirectoryStore),
            Arc::new(NoOpQueryCache),
        )
        .unwrap();
        let (response, json) = get_json(&app, "/api/search/suggestions?q=p").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json["data"]["suggestions"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn favorites_require_a_client_id() {
        let app = app_with(seeded_store());
        let (response, json) = get_json(&app, "/api/favorites").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn admin_routes_require_bearer_token() {
        let app = app_with(seeded_store());
        let (response, _) = get_json(&app, "/api/admin/sources").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/api/admin/sources")
            .header("Authorization", format!("Bearer {}", ADMIN_TOKEN))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_absent_without_token() {
        let config = ServerConfig {
            admin_token: None,
            ..test_config()
        };
        let app = make_app(config, seeded_store(), Arc::new(NoOpQueryCache)).unwrap();
        let (response, json) = get_json(&app, "/api/admin/sources").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn home_reports_version() {
        let app = app_with(seeded_store());
        let (response, json) = get_json(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }
}
