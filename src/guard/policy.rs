//! Access decisions.
//!
//! Pure function of (path, query, session) so every outcome is testable
//! without a backend.

use url::form_urlencoded;

use crate::config::{GuardConfig, LandingConfig};
use crate::guard::rules::{path_has_prefix, RuleTable};
use crate::guard::session::Session;

/// Outcome of the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Pass through unmodified.
    Allow,
    /// Guarded path without a session; location carries the return path.
    RedirectToLogin(String),
    /// Guarded path, session role not permitted.
    Denied(String),
    /// Auth page opened while signed in; location is the role's landing page.
    AlreadySignedIn(String),
}

impl AccessDecision {
    pub fn label(&self) -> &'static str {
        match self {
            AccessDecision::Allow => "allow",
            AccessDecision::RedirectToLogin(_) => "login",
            AccessDecision::Denied(_) => "denied",
            AccessDecision::AlreadySignedIn(_) => "signed_in",
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToLogin(l) | AccessDecision::Denied(l) | AccessDecision::AlreadySignedIn(l) => Some(l),
        }
    }
}

/// Compiled guard configuration.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    table: RuleTable,
    auth_pages: Vec<String>,
    excluded_prefixes: Vec<String>,
    excluded_extensions: Vec<String>,
    login_path: String,
    redirect_param: String,
    denied_path: String,
    landing: LandingConfig,
}

impl GuardPolicy {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            table: RuleTable::new(config.rules.clone()),
            auth_pages: config.auth_pages.clone(),
            excluded_prefixes: config.excluded_prefixes.clone(),
            excluded_extensions: config.excluded_extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            login_path: config.login_path.clone(),
            redirect_param: config.redirect_param.clone(),
            denied_path: config.denied_path.clone(),
            landing: config.landing.clone(),
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// API routes and static assets bypass the guard entirely.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.excluded_prefixes.iter().any(|prefix| path_has_prefix(path, prefix)) {
            return true;
        }
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.excluded_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    pub fn is_auth_page(&self, path: &str) -> bool {
        self.auth_pages.iter().any(|page| page == path)
    }

    /// Whether the decision for `path` depends on the session at all.
    pub fn needs_session(&self, path: &str) -> bool {
        self.is_auth_page(path) || self.table.is_guarded(path)
    }

    pub fn decide(&self, path: &str, query: Option<&str>, session: Option<&Session>) -> AccessDecision {
        if self.is_auth_page(path) {
            return match session {
                Some(session) => AccessDecision::AlreadySignedIn(self.landing.for_role(session.role()).to_string()),
                None => AccessDecision::Allow,
            };
        }

        let Some(rule) = self.table.first_match(path) else {
            return AccessDecision::Allow;
        };

        match session {
            None => AccessDecision::RedirectToLogin(self.login_location(path, query)),
            Some(session) if rule.permits(session.role()) => AccessDecision::Allow,
            Some(_) => AccessDecision::Denied(self.denied_path.clone()),
        }
    }

    /// `{login}?{param}={urlencoded path+query}`.
    pub fn login_location(&self, path: &str, query: Option<&str>) -> String {
        let original = match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.redirect_param, &original)
            .finish();
        format!("{}?{}", self.login_path, encoded)
    }
}
