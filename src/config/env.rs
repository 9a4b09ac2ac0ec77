//! Environment overrides.

/// Variables consulted for the backend base URL, in priority order.
pub const BACKEND_URL_VARS: [&str; 3] = ["EDGE_BACKEND_URL", "BACKEND_URL", "API_BASE_URL"];

/// Used when neither the environment nor the config file names a backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Resolve the backend base URL.
///
/// The first non-empty environment variable wins, then the config file value,
/// then [`DEFAULT_BACKEND_URL`]. Trailing slashes are trimmed.
pub fn resolve_backend_url<F>(lookup: F, configured: Option<&str>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = BACKEND_URL_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty());

    let chosen = match from_env {
        Some(value) => value,
        None => configured
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .to_string(),
    };

    trim_trailing_slashes(chosen.trim()).to_string()
}

/// Resolve against the process environment.
pub fn backend_url_from_env(configured: Option<&str>) -> String {
    resolve_backend_url(|name| std::env::var(name).ok(), configured)
}

pub fn trim_trailing_slashes(url: &str) -> &str {
    url.trim_end_matches('/')
}
