use super::envelope::{ApiError, RequestContext};
use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

pub const COOKIE_CLIENT_ID_KEY: &str = "client_id";
pub const HEADER_CLIENT_ID_KEY: &str = "X-Client-ID";

const MAX_CLIENT_ID_LENGTH: usize = 128;

/// Opaque identifier of the browser that owns a set of favorites. Issuing it
/// is someone else's job; this only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

fn request_context(parts: &Parts) -> RequestContext {
    parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default()
}

fn extract_client_id_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_CLIENT_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

fn extract_client_id_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_CLIENT_ID_KEY)
        .map(|c| c.value().trim().to_string())
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_id = extract_client_id_from_headers(parts)
            .filter(|s| !s.is_empty())
            .or_else(|| extract_client_id_from_cookies(parts))
            .filter(|s| !s.is_empty() && s.len() <= MAX_CLIENT_ID_LENGTH);

        match client_id {
            Some(id) => Ok(ClientIdentity(id)),
            None => {
                debug!("No client id in headers nor cookies.");
                Err(request_context(parts).fail(ApiError::Unauthorized(
                    "A client id is required".to_string(),
                )))
            }
        }
    }
}

/// Proof that the caller presented the configured admin bearer token.
#[derive(Debug)]
pub struct AdminSession;

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.admin_token.as_deref();
        match (expected, extract_bearer_token(parts)) {
            (Some(expected), Some(given)) if !expected.is_empty() && expected == given => {
                Ok(AdminSession)
            }
            _ => {
                debug!("Rejecting admin request without a valid bearer token.");
                Err(request_context(parts).fail(ApiError::Unauthorized(
                    "A valid admin token is required".to_string(),
                )))
            }
        }
    }
}
