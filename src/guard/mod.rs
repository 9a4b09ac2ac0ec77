//! Role-based access guard.
//!
//! # Data Flow
//! ```text
//! Navigable request
//!     → path.rs (non-canonical? 308 to the canonical path)
//!     → policy.rs (excluded? auth page? guarded?)
//!     → session.rs (ask backend, only when the decision depends on it)
//!     → policy.rs (first matching rule decides)
//!     → middleware.rs (pass through, or 307 to login / root / landing)
//! ```
//!
//! # Design Decisions
//! - Rules are an ordered list; first match wins
//! - Session failures are "no session": guarded paths fail closed,
//!   unguarded paths fail open
//! - The session is per request and never cached

pub mod middleware;
pub mod path;
pub mod policy;
pub mod role;
pub mod rules;
pub mod session;

pub use middleware::role_guard_middleware;
pub use path::canonical_path;
pub use policy::{AccessDecision, GuardPolicy};
pub use role::Role;
pub use rules::{RoleRule, RuleTable};
pub use session::{BackendSessionResolver, Session, SessionEndpoint, SessionError, SessionResolver};
