//! Upstream target URL construction.

use axum::http::Uri;

/// Where a forwarded request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Base URL without trailing slash, e.g. `http://backend:5000`.
    base: String,
    /// Prefix stripped from the inbound path, e.g. `/api`.
    route_prefix: String,
    /// Prefix prepended upstream, e.g. `/api`.
    upstream_prefix: String,
    /// Metric label.
    label: &'static str,
}

impl UpstreamTarget {
    /// `/api/*` on the edge → `{base}/api/*` on the backend.
    pub fn api(base: &str, api_prefix: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            route_prefix: api_prefix.trim_end_matches('/').to_string(),
            upstream_prefix: api_prefix.trim_end_matches('/').to_string(),
            label: "api",
        }
    }

    /// Any path on the edge → the same path on the page origin.
    pub fn pages(origin: &str) -> Self {
        Self {
            base: origin.trim_end_matches('/').to_string(),
            route_prefix: String::new(),
            upstream_prefix: String::new(),
            label: "pages",
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Raw (still percent-encoded) wildcard part of the inbound path.
    ///
    /// Only the single separator after the route prefix is removed; the
    /// rest of the path is forwarded exactly as the guard saw it.
    pub fn wildcard<'a>(&self, path: &'a str) -> &'a str {
        let rest = path.strip_prefix(self.route_prefix.as_str()).unwrap_or(path);
        rest.strip_prefix('/').unwrap_or(rest)
    }

    /// `{base}{prefix}/{wildcard}` plus the inbound query, copied verbatim.
    pub fn url_for(&self, uri: &Uri) -> String {
        let mut url = format!("{}{}/{}", self.base, self.upstream_prefix, self.wildcard(uri.path()));
        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}
