//! Route handlers for the API proxy and page pass-through.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::EdgeError;
use crate::http::state::AppState;

/// `/api` and `/api/*`: forward to the backend.
pub async fn api_proxy(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, EdgeError> {
    let runtime = state.runtime();
    runtime.forwarder.forward(&runtime.api_target, request).await
}

/// Everything else the guard lets through: forward to the page origin.
pub async fn pages(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let runtime = state.runtime();
    match &runtime.pages_target {
        Some(target) => runtime.forwarder.forward(target, request).await.into_response(),
        None => {
            tracing::debug!(path = %request.uri().path(), "No page origin configured");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
