//! Request-path errors and their HTTP mapping.

use std::time::Duration;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;

/// Errors raised while forwarding a request upstream.
///
/// Upstream error *responses* are not errors here; they are relayed verbatim.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    #[error("upstream unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("invalid upstream target '{0}'")]
    InvalidTarget(String),

    #[error("failed to build response: {0}")]
    ResponseBuild(#[from] axum::http::Error),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EdgeError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            EdgeError::InvalidTarget(_) | EdgeError::ResponseBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EdgeError::Upstream(_) => "unreachable",
            EdgeError::UpstreamTimeout(_) => "timeout",
            EdgeError::InvalidTarget(_) => "invalid_target",
            EdgeError::ResponseBuild(_) => "response_build",
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            EdgeError::UpstreamTimeout(_) => tracing::warn!(status = %status, error = %self, "Upstream timeout"),
            _ => tracing::error!(status = %status, error = %self, "Proxy error"),
        }
        metrics::record_upstream_error(self.kind());

        let message = match status {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Internal proxy error",
        };

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = status;
        response
    }
}
