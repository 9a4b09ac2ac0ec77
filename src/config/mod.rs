//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (backend URL from environment fallbacks)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → compiled into EdgeRuntime, shared via ArcSwap
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → server swaps in a new EdgeRuntime
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow an empty or missing config file
//! - Environment wins over the file for the backend URL
//! - Invalid reloads are logged and dropped; the running config stays

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, EdgeConfig, GuardConfig, LandingConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PagesConfig, ProxyConfig, TimeoutConfig,
};
