//! HTTP caching middleware

use axum::{
    body::Body,
    extract::State,
    http::{header::CACHE_CONTROL, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// `Cache-Control` policy of a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Cacheable by shared caches for the given number of seconds.
    Shared { s_maxage_sec: u32 },
    NoStore,
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::Shared { s_maxage_sec } => format!("public, s-maxage={}", s_maxage_sec),
            CachePolicy::NoStore => "no-cache, no-store, must-revalidate".to_string(),
        }
    }
}

/// Stamps the policy on every response of the group. Shared caching is only
/// advertised for successful responses.
pub async fn http_cache(
    State(policy): State<CachePolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let policy = match policy {
        CachePolicy::Shared { .. } if !response.status().is_success() => CachePolicy::NoStore,
        other => other,
    };
    if let Ok(value) = HeaderValue::from_str(&policy.header_value()) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    response
}
