//! Error responses for the session API.
//!
//! Every error maps to a status code with an empty body.

use crate::metrics;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use huddle_core::RegistryError;
use huddle_protocol::ProtocolError;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors returned by the request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session or client does not exist.
    #[error(transparent)]
    NotFound(#[from] RegistryError),

    /// The request body could not be read.
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// The request body is not a valid message.
    #[error("Failed to decode request body: {0}")]
    Decode(#[source] ProtocolError),

    /// The response could not be encoded.
    #[error("Failed to encode response: {0}")]
    Encode(#[source] ProtocolError),

    /// The request cannot be upgraded to a WebSocket.
    #[error("WebSocket upgrade failed: {0}")]
    Upgrade(String),

    /// Cross-origin upgrade on an origin-checked endpoint.
    #[error("Cross-origin request rejected: {0}")]
    Forbidden(String),
}

impl ApiError {
    /// Get the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BodyRead(_)
            | ApiError::Decode(_)
            | ApiError::Encode(_)
            | ApiError::Upgrade(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BodyRead(_) => "body_read",
            ApiError::Decode(_) => "decode",
            ApiError::Encode(_) => "encode",
            ApiError::Upgrade(_) => "upgrade",
            ApiError::Forbidden(_) => "forbidden",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::NotFound(_) => debug!(error = %self, "Not found"),
            ApiError::Encode(_) => error!(error = %self, "Request failed"),
            _ => warn!(error = %self, kind = self.kind(), "Request failed"),
        }
        metrics::record_error(self.kind());

        status.into_response()
    }
}
