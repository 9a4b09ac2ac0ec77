//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::guard::role::Role;
use crate::guard::rules::{default_rules, RoleRule};

/// Root configuration for the storefront edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Remote REST backend the API routes are forwarded to.
    pub backend: BackendConfig,

    /// Forwarding behavior shared by the API and page routes.
    pub proxy: ProxyConfig,

    /// Origin serving the storefront pages.
    pub pages: PagesConfig,

    /// Role-based access guard.
    pub guard: GuardConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend. Environment variables take precedence,
    /// see [`crate::config::env::BACKEND_URL_VARS`].
    pub base_url: Option<String>,

    /// Path prefix of the inbound API routes and of the upstream API.
    pub api_prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_prefix: "/api".to_string(),
        }
    }
}

/// Forwarding behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Derive the caller's scheme from an inbound `x-forwarded-proto`
    /// (set by a TLS-terminating load balancer in front of the edge).
    pub trust_forwarded_proto: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_proto: true,
        }
    }
}

/// Page origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PagesConfig {
    /// Origin that renders the storefront. Allowed page requests get 404 when unset.
    pub origin_url: Option<String>,
}

/// Role-based access guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Backend session endpoint, relative to the backend base URL.
    pub session_path: String,

    /// Login page unauthenticated callers are sent to.
    pub login_path: String,

    /// Query parameter carrying the original path on the login redirect.
    pub redirect_param: String,

    /// Where callers with the wrong role are sent.
    pub denied_path: String,

    /// Pages that bounce signed-in callers to their landing page.
    pub auth_pages: Vec<String>,

    /// Path prefixes the guard never inspects.
    pub excluded_prefixes: Vec<String>,

    /// File extensions (without dot) the guard never inspects.
    pub excluded_extensions: Vec<String>,

    /// Landing page per role.
    pub landing: LandingConfig,

    /// Ordered prefix → roles table. First match wins.
    pub rules: Vec<RoleRule>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            session_path: "/api/auth/get-session".to_string(),
            login_path: "/login".to_string(),
            redirect_param: "redirect".to_string(),
            denied_path: "/".to_string(),
            auth_pages: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/sign-in".to_string(),
            ],
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next".to_string(),
                "/static".to_string(),
                "/assets".to_string(),
                "/favicon.ico".to_string(),
                "/robots.txt".to_string(),
            ],
            excluded_extensions: ["css", "js", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            landing: LandingConfig::default(),
            rules: default_rules(),
        }
    }
}

/// Landing page per role, used when a signed-in caller opens an auth page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LandingConfig {
    pub customer: String,
    pub provider: String,
    pub admin: String,
    pub super_admin: String,
}

impl LandingConfig {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Customer => &self.customer,
            Role::Provider => &self.provider,
            Role::Admin => &self.admin,
            Role::SuperAdmin => &self.super_admin,
        }
    }
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            customer: "/".to_string(),
            provider: "/provider".to_string(),
            admin: "/admin".to_string(),
            super_admin: "/super-admin".to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the upstream response head, in seconds.
    pub upstream_secs: u64,

    /// Time allowed for the whole session check, in seconds.
    pub session_check_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            session_check_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "storefront_edge=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: EdgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.backend.api_prefix, "/api");
        assert_eq!(config.guard.rules.len(), 7);
        assert_eq!(config.guard.landing.for_role(Role::Provider), "/provider");
    }

    #[test]
    fn test_rules_override_replaces_table() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [guard]
            login_path = "/signin"

            [[guard.rules]]
            prefix = "/kitchen"
            roles = ["provider", "admin"]
            "#,
        )
        .unwrap();

        assert_eq!(config.guard.login_path, "/signin");
        assert_eq!(config.guard.rules.len(), 1);
        assert_eq!(config.guard.rules[0].roles, vec![Role::Provider, Role::Admin]);
        // Untouched fields keep their defaults
        assert_eq!(config.guard.redirect_param, "redirect");
    }

    #[test]
    fn test_log_format_parsing() {
        let config: EdgeConfig = toml::from_str("[observability]\nlog_format = \"json\"").unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
