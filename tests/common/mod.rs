//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use storefront_edge::config::EdgeConfig;
use storefront_edge::{EdgeServer, Shutdown};

/// Start a mock marketplace backend on an ephemeral port.
///
/// - `/api/echo/*` reflects method, path, query, headers and body as JSON,
///   and repeats method and body length in `x-echo-*` headers (kept on HEAD)
/// - `/api/cookies` sets two cookies
/// - `/api/missing` answers 404 with a JSON error
/// - `/api/moved` answers 302
/// - `/api/slow` answers after three seconds
/// - `/api/auth/get-session` derives the session from a `role=` cookie
/// - anything else answers `page:{path}` (doubles as the page origin)
pub async fn start_mock_backend() -> SocketAddr {
    let app = Router::new()
        .route("/api/echo/{*rest}", any(echo))
        .route("/api/cookies", get(cookies))
        .route("/api/missing", get(missing))
        .route("/api/moved", get(moved))
        .route("/api/slow", get(slow))
        .route("/api/auth/get-session", get(session))
        .fallback(page);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Edge config pointing both the backend and the page origin at `backend`.
pub fn edge_config(backend: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.base_url = Some(format!("http://{}", backend));
    config.pages.origin_url = Some(format!("http://{}", backend));
    config
}

/// A running edge.
pub struct RunningEdge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<EdgeConfig>,
}

impl RunningEdge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningEdge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_edge(config: EdgeConfig) -> RunningEdge {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = EdgeServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    RunningEdge {
        addr,
        shutdown,
        config_updates,
    }
}

/// Client that neither follows redirects nor uses environment proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers.iter() {
        header_map
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }

    let received_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();

    let mut response = Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": header_map,
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response();
    let echo = response.headers_mut();
    echo.insert("x-echo-method", method.as_str().parse().unwrap());
    echo.insert("x-echo-body-bytes", body.len().to_string().parse().unwrap());
    echo.insert("x-echo-content-length", received_length.parse().unwrap());
    response
}

async fn cookies() -> Response {
    let mut response = Json(json!({ "ok": true })).into_response();
    response.headers_mut().append(header::SET_COOKIE, "a=1; Path=/".parse().unwrap());
    response.headers_mut().append(header::SET_COOKIE, "b=2; Path=/".parse().unwrap());
    response
}

async fn missing() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "meal not found", "code": 404 }))).into_response()
}

async fn moved() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/api/elsewhere")], "moved").into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

async fn session(headers: HeaderMap) -> Response {
    let role = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .filter_map(|pair| pair.trim().strip_prefix("role="))
                .next()
                .map(str::to_string)
        });

    match role.as_deref() {
        None => Json(Value::Null).into_response(),
        Some("broken") => (StatusCode::OK, "<html>not json</html>").into_response(),
        Some("error") => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        Some(role) => Json(json!({ "user": { "id": format!("u-{}", role), "role": role } })).into_response(),
    }
}

async fn page(uri: Uri) -> String {
    format!("page:{}", uri.path())
}
