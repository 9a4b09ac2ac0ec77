//! Request forwarding.
//!
//! # Responsibilities
//! - Rewrite the inbound request onto an upstream target
//! - Stream the request body (never for GET/HEAD) and the response body
//! - Relay upstream status, headers and cookies unchanged
//!
//! # Design Decisions
//! - Redirects are never followed; 3xx responses reach the caller as-is
//! - No retries: a failed forward is final for this request
//! - Only the response head is bounded by the upstream timeout, so long
//!   downloads are not cut off

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, Method, Request},
    response::Response,
};
use sync_wrapper::SyncStream;

use crate::error::EdgeError;
use crate::observability::metrics;
use crate::proxy::headers::{forward_request_headers, relay_response_headers, RequestOrigin};
use crate::proxy::target::UpstreamTarget;

/// Build the shared upstream client.
///
/// Redirects are not followed and environment proxies are ignored; the
/// backend is always contacted directly.
pub fn build_upstream_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

/// Forwards requests with one set of settings.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    trust_forwarded_proto: bool,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, trust_forwarded_proto: bool, timeout: Duration) -> Self {
        Self {
            client,
            trust_forwarded_proto,
            timeout,
        }
    }

    /// Forward `request` to `target` and relay the upstream response.
    pub async fn forward(&self, target: &UpstreamTarget, request: Request<Body>) -> Result<Response, EdgeError> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();

        let url = target.url_for(&parts.uri);
        let url = reqwest::Url::parse(&url).map_err(|_| EdgeError::InvalidTarget(url))?;

        let caller = RequestOrigin::from_request(&parts.headers, &parts.uri, self.trust_forwarded_proto);
        let mut headers = forward_request_headers(&parts.headers, &caller);

        tracing::debug!(
            request_id = ?parts.headers.get("x-request-id"),
            method = %parts.method,
            path = %parts.uri.path(),
            upstream = %url,
            "Forwarding request"
        );

        let carries_body = !matches!(parts.method, Method::GET | Method::HEAD);
        if !carries_body {
            headers.remove(CONTENT_LENGTH);
        }

        let mut upstream_req = self.client.request(parts.method.clone(), url).headers(headers);
        if carries_body {
            // reqwest wants a Sync stream; axum bodies are only Send
            upstream_req = upstream_req.body(reqwest::Body::wrap_stream(SyncStream::new(body.into_data_stream())));
        }

        let upstream = match tokio::time::timeout(self.timeout, upstream_req.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(EdgeError::Upstream(e)),
            Err(_) => return Err(EdgeError::UpstreamTimeout(self.timeout)),
        };

        let status = upstream.status();
        metrics::record_proxy_request(parts.method.as_str(), status.as_u16(), target.label(), start);
        tracing::debug!(
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        let headers = relay_response_headers(upstream.headers());
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
