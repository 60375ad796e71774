//! Uniform JSON envelope for every API response.

use crate::directory_store::StoreWriteError;
use crate::search::{DirectoryError, FieldError, ValidationErrors};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, warn};

use super::metrics;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Per-request metadata, created once by the request id layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub received_at: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            received_at: Instant::now(),
        }
    }

    fn meta(&self) -> Meta {
        Meta {
            request_id: self.request_id.clone(),
            duration_ms: self.received_at.elapsed().as_millis() as u64,
        }
    }

    pub fn success<T: Serialize>(&self, data: T) -> ResponseEnvelope<T> {
        ResponseEnvelope {
            success: true,
            data: Some(data),
            error: None,
            meta: self.meta(),
        }
    }

    pub fn failure(&self, error: &ApiError) -> ResponseEnvelope<()> {
        self.failure_with_data(error, None)
    }

    pub fn failure_with_data<T: Serialize>(
        &self,
        error: &ApiError,
        data: Option<T>,
    ) -> ResponseEnvelope<T> {
        ResponseEnvelope {
            success: false,
            data,
            error: Some(error.body()),
            meta: self.meta(),
        }
    }

    /// 200 response carrying `data`.
    pub fn ok<T: Serialize>(&self, data: T) -> Response {
        self.respond(StatusCode::OK, data)
    }

    pub fn respond<T: Serialize>(&self, status: StatusCode, data: T) -> Response {
        (status, Json(self.success(data))).into_response()
    }

    /// Error response. Server-side failures are logged with the request id
    /// before being replaced by a generic message.
    pub fn fail(&self, error: ApiError) -> Response {
        self.fail_with_data::<()>(error, None)
    }

    pub fn fail_with_data<T: Serialize>(&self, error: ApiError, data: Option<T>) -> Response {
        self.log_error(&error);
        metrics::record_error(error.code());
        (error.status(), Json(self.failure_with_data(&error, data))).into_response()
    }

    fn log_error(&self, error: &ApiError) {
        match error {
            ApiError::StorageUnavailable(source) | ApiError::Internal(source) => {
                error!("[{}] {}: {:#}", self.request_id, error.code(), source)
            }
            _ => warn!("[{}] {}: {}", self.request_id, error.code(), error),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub request_id: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub meta: Meta,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidParameter {
        message: String,
        details: Vec<FieldError>,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage unavailable")]
    StorageUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            message: message.into(),
            details: vec![],
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameter { .. } => "INVALID_PARAMETER",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public representation; never includes the source of server-side errors.
    fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            ApiError::InvalidParameter { message, details } => (
                message.clone(),
                (!details.is_empty()).then(|| details.clone()),
            ),
            ApiError::StorageUnavailable(_) => {
                ("The directory is temporarily unavailable".to_string(), None)
            }
            ApiError::Internal(_) => ("An unexpected error occurred".to_string(), None),
            other => (other.to_string(), None),
        };
        ErrorBody {
            code: self.code(),
            message,
            details,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::InvalidParameter {
            message: format!("Invalid parameters: {}", errors.fields().join(", ")),
            details: errors.0,
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::StorageUnavailable(source) => ApiError::StorageUnavailable(source),
        }
    }
}

impl From<StoreWriteError> for ApiError {
    fn from(error: StoreWriteError) -> Self {
        match error {
            StoreWriteError::Other(source) => ApiError::StorageUnavailable(source),
            refused => ApiError::invalid(refused.to_string()),
        }
    }
}
