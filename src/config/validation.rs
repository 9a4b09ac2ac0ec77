//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, paths and timeouts
//! - Detect rules that can never match and redirect loops
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::EdgeConfig;
use crate::guard::role::Role;
use crate::guard::rules::RuleTable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    Url { field: &'static str, value: String },

    #[error("{field}: '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("backend.api_prefix '{0}' must name a path below the root")]
    RootApiPrefix(String),

    #[error("rule '{0}' must not end with '/'")]
    TrailingSlash(String),

    #[error("rule '{0}' allows no roles")]
    EmptyRoles(String),

    #[error("rule '{prefix}' is unreachable, '{shadowed_by}' is checked first")]
    ShadowedRule { prefix: String, shadowed_by: String },

    #[error("{field} '{path}' is itself guarded by rule '{prefix}'")]
    GuardedRedirectTarget {
        field: &'static str,
        path: String,
        prefix: String,
    },

    #[error("landing page '{path}' for role {role} is not permitted for that role")]
    LandingNotPermitted { role: Role, path: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a fully resolved configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Some(base) = &config.backend.base_url {
        check_url(&mut errors, "backend.base_url", base);
    }
    if let Some(origin) = &config.pages.origin_url {
        check_url(&mut errors, "pages.origin_url", origin);
    }

    let guard = &config.guard;
    check_path(&mut errors, "backend.api_prefix", &config.backend.api_prefix);
    if config.backend.api_prefix.trim_end_matches('/').is_empty() {
        errors.push(ValidationError::RootApiPrefix(config.backend.api_prefix.clone()));
    }
    check_path(&mut errors, "guard.session_path", &guard.session_path);
    check_path(&mut errors, "guard.login_path", &guard.login_path);
    check_path(&mut errors, "guard.denied_path", &guard.denied_path);
    for page in &guard.auth_pages {
        check_path(&mut errors, "guard.auth_pages", page);
    }
    for prefix in &guard.excluded_prefixes {
        check_path(&mut errors, "guard.excluded_prefixes", prefix);
    }
    for role in Role::ALL {
        check_path(&mut errors, "guard.landing", guard.landing.for_role(role));
    }

    for (idx, rule) in guard.rules.iter().enumerate() {
        check_path(&mut errors, "guard.rules", &rule.prefix);
        if rule.prefix.len() > 1 && rule.prefix.ends_with('/') {
            errors.push(ValidationError::TrailingSlash(rule.prefix.clone()));
        }
        if rule.roles.is_empty() {
            errors.push(ValidationError::EmptyRoles(rule.prefix.clone()));
        }
        if let Some(earlier) = guard.rules[..idx].iter().find(|r| r.matches(&rule.prefix)) {
            errors.push(ValidationError::ShadowedRule {
                prefix: rule.prefix.clone(),
                shadowed_by: earlier.prefix.clone(),
            });
        }
    }

    let table = RuleTable::new(guard.rules.clone());
    for (field, path) in [("guard.login_path", &guard.login_path), ("guard.denied_path", &guard.denied_path)] {
        if let Some(rule) = table.first_match(path) {
            errors.push(ValidationError::GuardedRedirectTarget {
                field,
                path: path.clone(),
                prefix: rule.prefix.clone(),
            });
        }
    }
    for role in Role::ALL {
        let landing = guard.landing.for_role(role);
        if let Some(rule) = table.first_match(landing) {
            if !rule.permits(role) {
                errors.push(ValidationError::LandingNotPermitted {
                    role,
                    path: landing.to_string(),
                });
            }
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.upstream_secs"));
    }
    if config.timeouts.session_check_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.session_check_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::Url {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}
