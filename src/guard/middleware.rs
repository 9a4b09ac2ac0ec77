//! Role guard middleware.
//! Enforces the prefix → roles table on navigable requests.
//!
//! Non-canonical paths are answered with a 308 to their canonical form
//! before anything else, so rules and upstreams only ever see that form.

use std::borrow::Cow;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::guard::path::canonical_path;
use crate::guard::policy::AccessDecision;
use crate::http::state::AppState;
use crate::observability::metrics;

pub async fn role_guard_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Cow::Owned(canonical) = canonical_path(req.uri().path()) {
        let location = match req.uri().query() {
            Some(query) => format!("{}?{}", canonical, query),
            None => canonical,
        };
        tracing::debug!(path = %req.uri().path(), location = %location, "Redirecting to canonical path");
        metrics::record_guard_decision("canonical");
        return Redirect::permanent(&location).into_response();
    }

    let runtime = state.runtime();
    let policy = &runtime.guard;
    let path = req.uri().path().to_string();

    // 1. API routes and assets are not navigation
    if policy.is_excluded(&path) {
        return next.run(req).await;
    }

    // 2. Unguarded pages never need the backend
    if !policy.needs_session(&path) {
        metrics::record_guard_decision(AccessDecision::Allow.label());
        return next.run(req).await;
    }

    // 3. Resolve session; any failure means no session
    let headers = req.headers().clone();
    let session = match state.sessions.resolve(&runtime.session_endpoint, &headers).await {
        Ok(Some(session)) => {
            metrics::record_session_check("resolved");
            Some(session)
        }
        Ok(None) => {
            metrics::record_session_check("absent");
            None
        }
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Session check failed, treating as signed out");
            metrics::record_session_check("failed");
            None
        }
    };

    // 4. Decide
    let decision = policy.decide(&path, req.uri().query(), session.as_ref());
    metrics::record_guard_decision(decision.label());

    match decision {
        AccessDecision::Allow => {
            if let Some(session) = session {
                req.extensions_mut().insert(session);
            }
            next.run(req).await
        }
        redirect => {
            let location = redirect.location().unwrap_or("/");
            tracing::info!(
                path = %path,
                decision = redirect.label(),
                role = ?session.as_ref().map(|s| s.role()),
                location = %location,
                "Access redirected"
            );
            Redirect::temporary(location).into_response()
        }
    }
}
