//! End-to-end tests for tool search, browsing and the query cache

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::Value;

async fn json(response: reqwest::Response) -> Value {
    response.json().await.expect("Body is not JSON")
}

fn slugs(body: &Value) -> Vec<String> {
    let mut slugs: Vec<String> = body["data"]["items"]
        .as_array()
        .expect("items is not an array")
        .iter()
        .map(|t| t["slug"].as_str().unwrap().to_string())
        .collect();
    slugs.sort();
    slugs
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_default_search_lists_only_visible_tools() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.search_tools(&[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());

    let body = json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], VISIBLE_TOOL_COUNT);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["pageSize"], 20);
    assert!(!slugs(&body).contains(&DRAFT_SLUG.to_string()));
    assert!(body["meta"]["requestId"].is_string());
}

#[tokio::test]
async fn test_text_search_matches_name_and_description() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json(client.search_tools(&[("q", "github")]).await).await;
    assert_eq!(slugs(&body), vec![GITHUB_SLUG.to_string()]);

    // "PostgreSQL" in the description, "SQLite" in the name
    let body = json(client.search_tools(&[("q", "sql")]).await).await;
    assert_eq!(
        slugs(&body),
        vec![POSTGRES_SLUG.to_string(), SQLITE_SLUG.to_string()]
    );
}

#[tokio::test]
async fn test_tag_filter_requires_every_tag() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json(client.search_tools(&[("tags", "official")]).await).await;
    assert_eq!(
        slugs(&body),
        vec![GITHUB_SLUG.to_string(), POSTGRES_SLUG.to_string()]
    );

    let body = json(client.search_tools(&[("tags", "official,sql")]).await).await;
    assert_eq!(slugs(&body), vec![POSTGRES_SLUG.to_string()]);
}

#[tokio::test]
async fn test_category_filter() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json(client.search_tools(&[("category", CATEGORY_DATABASES)]).await).await;
    assert_eq!(
        slugs(&body),
        vec![POSTGRES_SLUG.to_string(), SQLITE_SLUG.to_string()]
    );

    let body = json(client.search_tools(&[("category", "nothing-here")]).await).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_pagination_reports_total() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let first = json(client.search_tools(&[("pageSize", "2"), ("sort", "latest")]).await).await;
    let second = json(
        client
            .search_tools(&[("pageSize", "2"), ("page", "2"), ("sort", "latest")])
            .await,
    )
    .await;

    assert_eq!(first["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(second["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(first["data"]["total"], VISIBLE_TOOL_COUNT);
    assert_eq!(second["data"]["total"], VISIBLE_TOOL_COUNT);

    let mut all = slugs(&first);
    all.extend(slugs(&second));
    all.sort();
    all.dedup();
    assert_eq!(all.len(), VISIBLE_TOOL_COUNT as usize);
}

#[tokio::test]
async fn test_popular_sort_follows_favorites() {
    let server = TestServer::spawn().await;
    let sqlite_id = server.tool_id(SQLITE_SLUG);
    for owner in ["client-a", "client-b"] {
        let response = TestClient::with_client_id(server.base_url.clone(), owner)
            .add_favorite(&sqlite_id)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let client = TestClient::new(server.base_url.clone());
    let body = json(client.search_tools(&[("sort", "popular")]).await).await;
    assert_eq!(body["data"]["items"][0]["slug"], SQLITE_SLUG);
    assert_eq!(body["data"]["items"][0]["popularity"], 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_parameters_are_all_reported() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .search_tools(&[("page", "0"), ("pageSize", "200"), ("sort", "random")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
    let mut fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    fields.sort();
    assert_eq!(fields, vec!["page", "pageSize", "sort"]);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_page_size_bounds() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for (size, expected) in [
        ("1", StatusCode::OK),
        ("100", StatusCode::OK),
        ("0", StatusCode::BAD_REQUEST),
        ("101", StatusCode::BAD_REQUEST),
    ] {
        let response = client.search_tools(&[("pageSize", size)]).await;
        assert_eq!(response.status(), expected, "pageSize={}", size);
    }
}

// =============================================================================
// Query cache
// =============================================================================

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let first = client
        .search_tools(&[("q", "github"), ("sort", "latest")])
        .await;
    assert_eq!(first.headers()["x-cache"], "MISS");
    let first_body = json(first).await;

    // Same request, different parameter order
    let second = client
        .search_tools(&[("sort", "latest"), ("q", "github")])
        .await;
    assert_eq!(second.headers()["x-cache"], "HIT");
    let second_body = json(second).await;

    assert_eq!(first_body["data"], second_body["data"]);
    assert_ne!(first_body["meta"]["requestId"], second_body["meta"]["requestId"]);
}

// =============================================================================
// Single tool, categories, tags, suggestions
// =============================================================================

#[tokio::test]
async fn test_get_tool_by_slug() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_tool(POSTGRES_SLUG).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["data"]["name"], POSTGRES_NAME);
    assert_eq!(body["data"]["category"], CATEGORY_DATABASES);
    assert_eq!(body["data"]["tags"], serde_json::json!(["official", "sql"]));

    let response = client.get_tool(DRAFT_SLUG).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_categories_and_tags_are_stable() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let first = client.categories().await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["cache-control"], "public, s-maxage=3600");
    let first = json(first).await;
    let second = json(client.categories().await).await;
    assert_eq!(
        serde_json::to_vec(&first["data"]).unwrap(),
        serde_json::to_vec(&second["data"]).unwrap()
    );

    let databases = first["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["slug"] == CATEGORY_DATABASES)
        .unwrap();
    assert_eq!(databases["toolCount"], 2);

    let tags = client.tags().await;
    assert_eq!(tags.headers()["cache-control"], "public, s-maxage=1800");
    let tags = json(tags).await;
    let again = json(client.tags().await).await;
    assert_eq!(
        serde_json::to_vec(&tags["data"]).unwrap(),
        serde_json::to_vec(&again["data"]).unwrap()
    );
}

#[tokio::test]
async fn test_suggestions() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json(client.suggestions("s").await).await;
    assert_eq!(body["data"]["suggestions"], serde_json::json!([]));

    let body = json(client.suggestions("sq").await).await;
    let suggestions = body["data"]["suggestions"].as_array().unwrap();
    assert_eq!(suggestions[0]["kind"], "tool");
    assert_eq!(suggestions[0]["slug"], SQLITE_SLUG);
    assert!(suggestions
        .iter()
        .any(|s| s["kind"] == "tag" && s["slug"] == "sql"));
    assert!(suggestions.len() <= 8);
}

// =============================================================================
// Health and misc
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.health().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
    let body = json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"], "up");
}

#[tokio::test]
async fn test_unknown_api_route_is_enveloped() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.raw_get("/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_home_reports_version() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json(client.home().await).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
