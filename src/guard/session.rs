//! Session resolution against the backend.
//!
//! # State Machine
//! ```text
//! NoSession ──(2xx + JSON user with known role)──▶ SessionResolved(role)
//! NoSession ──(anything else)──▶ NoSession
//! ```
//!
//! Failures are reported as [`SessionError`] so they can be logged, but the
//! guard always treats them as "no session".

use std::time::Duration;

use axum::http::{
    header::{ACCEPT, COOKIE},
    HeaderMap, HeaderValue, StatusCode,
};
use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::guard::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
}

/// An authenticated caller, resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
}

impl Session {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            user: SessionUser { id: id.into(), role },
        }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("session check timed out after {0:?}")]
    Timeout(Duration),

    #[error("session endpoint returned {0}")]
    Status(StatusCode),

    #[error("malformed session body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Where and how long to ask for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEndpoint {
    pub url: String,
    pub timeout: Duration,
}

impl SessionEndpoint {
    pub fn new(backend_base: &str, session_path: &str, timeout: Duration) -> Self {
        Self {
            url: format!("{}{}", backend_base.trim_end_matches('/'), session_path),
            timeout,
        }
    }
}

/// Resolves the caller's session from the inbound request headers.
pub trait SessionResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        endpoint: &'a SessionEndpoint,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, Result<Option<Session>, SessionError>>;
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Parse a session body.
///
/// `null`, a missing user and a missing role all mean "no session".
pub fn parse_session(body: &[u8]) -> Result<Option<Session>, SessionError> {
    let raw: Option<RawSession> = serde_json::from_slice(body)?;
    let Some(user) = raw.and_then(|s| s.user) else {
        return Ok(None);
    };
    let Some(role) = user.role else {
        return Ok(None);
    };
    let role = role.parse::<Role>().map_err(|e| SessionError::UnknownRole(e.0))?;

    Ok(Some(Session {
        user: SessionUser {
            id: user.id.unwrap_or_default(),
            role,
        },
    }))
}

/// Asks the backend's session endpoint, forwarding the caller's cookies.
#[derive(Debug, Clone)]
pub struct BackendSessionResolver {
    client: reqwest::Client,
}

impl BackendSessionResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, endpoint: &SessionEndpoint, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let mut request = self
            .client
            .get(&endpoint.url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = joined_cookies(headers) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status));
        }
        let body = response.bytes().await?;
        parse_session(&body)
    }
}

impl SessionResolver for BackendSessionResolver {
    fn resolve<'a>(
        &'a self,
        endpoint: &'a SessionEndpoint,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, Result<Option<Session>, SessionError>> {
        Box::pin(async move {
            match tokio::time::timeout(endpoint.timeout, self.fetch(endpoint, headers)).await {
                Ok(result) => result,
                Err(_) => Err(SessionError::Timeout(endpoint.timeout)),
            }
        })
    }
}

/// All inbound `cookie` headers folded into one, as HTTP/1.1 expects.
fn joined_cookies(headers: &HeaderMap) -> Option<HeaderValue> {
    let parts: Vec<&[u8]> = headers
        .get_all(COOKIE)
        .iter()
        .map(HeaderValue::as_bytes)
        .filter(|v| !v.is_empty())
        .collect();
    match parts.as_slice() {
        [] => None,
        [single] => HeaderValue::from_bytes(single).ok(),
        many => HeaderValue::from_bytes(&many.join(&b"; "[..])).ok(),
    }
}
