//! Ordered role rule table.
//!
//! # Design Decisions
//! - Rules are kept in declaration order and scanned top to bottom
//! - First matching prefix wins; overlapping rules are never merged
//! - A path matches a prefix if it is equal to it or continues with `/`

use serde::{Deserialize, Serialize};

use crate::guard::role::Role;

/// A single `(prefix, allowed roles)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleRule {
    pub prefix: String,
    pub roles: Vec<Role>,
}

impl RoleRule {
    pub fn new(prefix: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            prefix: prefix.into(),
            roles: roles.to_vec(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path_has_prefix(path, &self.prefix)
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Segment-aware prefix check: `/admin` matches `/admin` and `/admin/x`, not `/administer`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Immutable, ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<RoleRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<RoleRule>) -> Self {
        Self { rules }
    }

    /// First rule whose prefix matches `path`, in declaration order.
    pub fn first_match(&self, path: &str) -> Option<&RoleRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn is_guarded(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    pub fn rules(&self) -> &[RoleRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Default marketplace table: admin areas, provider area, customer-only areas.
pub fn default_rules() -> Vec<RoleRule> {
    vec![
        RoleRule::new("/super-admin", &[Role::SuperAdmin]),
        RoleRule::new("/admin", &[Role::Admin, Role::SuperAdmin]),
        RoleRule::new("/provider", &[Role::Provider]),
        RoleRule::new("/orders", &[Role::Customer]),
        RoleRule::new("/checkout", &[Role::Customer]),
        RoleRule::new("/cart", &[Role::Customer]),
        RoleRule::new("/profile", &[Role::Customer]),
    ]
}
