//! HTTP access to the directory JSON API.
//!
//! Responses are unwrapped from the `{success, data, error, meta}` envelope;
//! failure envelopes become [`ClientError::Api`].

use crate::directory_store::{ResultPage, SearchSuggestion};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Header the server reads the anonymous client identity from.
const CLIENT_ID_HEADER: &str = "X-Client-ID";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The slice of the directory API used by the interactive widgets.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn suggestions(&self, query: &str) -> Result<Vec<SearchSuggestion>, ClientError>;

    async fn is_favorited(&self, tool_id: &str) -> Result<bool, ClientError>;

    async fn add_favorite(&self, tool_id: &str) -> Result<(), ClientError>;

    async fn remove_favorite(&self, tool_id: &str) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct WireError {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct WireEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct SuggestionsData {
    suggestions: Vec<SearchSuggestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteStatusData {
    is_favorited: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteBody<'a> {
    tool_id: &'a str,
}

pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
    client_id: String,
}

impl HttpDirectoryClient {
    /// `base_url` is the server root, e.g. `http://localhost:3001`.
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            client_id: client_id.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let envelope: WireEnvelope<T> = response.json().await?;
        match envelope {
            WireEnvelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            WireEnvelope {
                error: Some(error), ..
            } => Err(ClientError::Api {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
            }),
            _ => Err(ClientError::Decode(format!(
                "envelope without data or error (HTTP {})",
                status
            ))),
        }
    }

    /// Runs a public tool search with raw query parameters.
    pub async fn search_tools(&self, params: &[(&str, &str)]) -> Result<ResultPage, ClientError> {
        let response = self
            .client
            .get(self.url("/tools"))
            .query(params)
            .send()
            .await?;
        Self::read_envelope(response).await
    }
}

#[async_trait]
impl DirectoryApi for HttpDirectoryClient {
    async fn suggestions(&self, query: &str) -> Result<Vec<SearchSuggestion>, ClientError> {
        debug!("Fetching suggestions for {:?}", query);
        let response = self
            .client
            .get(self.url("/search/suggestions"))
            .query(&[("q", query)])
            .send()
            .await?;
        let data: SuggestionsData = Self::read_envelope(response).await?;
        Ok(data.suggestions)
    }

    async fn is_favorited(&self, tool_id: &str) -> Result<bool, ClientError> {
        let response = self
            .client
            .get(self.url("/favorites"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(&[("toolId", tool_id)])
            .send()
            .await?;
        let data: FavoriteStatusData = Self::read_envelope(response).await?;
        Ok(data.is_favorited)
    }

    async fn add_favorite(&self, tool_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("/favorites"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .json(&FavoriteBody { tool_id })
            .send()
            .await?;
        let _: FavoriteStatusData = Self::read_envelope(response).await?;
        Ok(())
    }

    async fn remove_favorite(&self, tool_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url("/favorites"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(&[("toolId", tool_id)])
            .send()
            .await?;
        let _: FavoriteStatusData = Self::read_envelope(response).await?;
        Ok(())
    }
}
