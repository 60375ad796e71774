//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per directory endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client. Favorites are keyed by the `X-Client-ID` header.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
    client_id: Option<String>,
    admin_token: Option<String>,
}

impl TestClient {
    /// Creates an anonymous client without a client id.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            client_id: None,
            admin_token: None,
        }
    }

    pub fn with_client_id(base_url: String, client_id: &str) -> Self {
        Self {
            client_id: Some(client_id.to_string()),
            ..Self::new(base_url)
        }
    }

    pub fn admin(base_url: String) -> Self {
        Self::admin_with_token(base_url, ADMIN_TOKEN)
    }

    pub fn admin_with_token(base_url: String, token: &str) -> Self {
        Self {
            admin_token: Some(token.to_string()),
            ..Self::new(base_url)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn with_identity(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match &self.client_id {
            Some(id) => request.header("X-Client-ID", id),
            None => request,
        };
        match &self.admin_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Response {
        self.with_identity(self.client.get(self.url(path)).query(query))
            .send()
            .await
            .expect("Request failed")
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Response {
        self.with_identity(self.client.post(self.url(path)).json(&body))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Public endpoints
    // ========================================================================

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn search_tools(&self, query: &[(&str, &str)]) -> Response {
        self.get("/tools", query).await
    }

    pub async fn get_tool(&self, slug: &str) -> Response {
        self.get(&format!("/tools/{}", slug), &[]).await
    }

    pub async fn suggestions(&self, q: &str) -> Response {
        self.get("/search/suggestions", &[("q", q)]).await
    }

    pub async fn categories(&self) -> Response {
        self.get("/categories", &[]).await
    }

    pub async fn tags(&self) -> Response {
        self.get("/tags", &[]).await
    }

    pub async fn health(&self) -> Response {
        self.get("/health", &[]).await
    }

    pub async fn raw_get(&self, path: &str) -> Response {
        self.get(path, &[]).await
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    pub async fn list_favorites(&self) -> Response {
        self.get("/favorites", &[]).await
    }

    pub async fn favorite_status(&self, tool_id: &str) -> Response {
        self.get("/favorites", &[("toolId", tool_id)]).await
    }

    pub async fn add_favorite(&self, tool_id: &str) -> Response {
        self.post("/favorites", json!({ "toolId": tool_id })).await
    }

    pub async fn remove_favorite(&self, tool_id: &str) -> Response {
        self.with_identity(
            self.client
                .delete(self.url("/favorites"))
                .query(&[("toolId", tool_id)]),
        )
        .send()
        .await
        .expect("Request failed")
    }

    // ========================================================================
    // Admin
    // ========================================================================

    pub async fn list_sources(&self) -> Response {
        self.get("/admin/sources", &[]).await
    }

    pub async fn add_source(&self, name: &str, url: &str) -> Response {
        self.post("/admin/sources", json!({ "name": name, "url": url }))
            .await
    }

    pub async fn delete_source(&self, id: impl std::fmt::Display) -> Response {
        self.with_identity(self.client.delete(self.url(&format!("/admin/sources/{}", id))))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn list_pending(&self) -> Response {
        self.get("/admin/ingest", &[]).await
    }

    pub async fn submit_candidate(&self, body: serde_json::Value) -> Response {
        self.post("/admin/ingest", body).await
    }

    pub async fn approve(&self, tool_id: &str) -> Response {
        self.post(&format!("/admin/ingest/{}/approve", tool_id), json!({}))
            .await
    }

    pub async fn reject(&self, tool_id: &str) -> Response {
        self.post(&format!("/admin/ingest/{}/reject", tool_id), json!({}))
            .await
    }
}
