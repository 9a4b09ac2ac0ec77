//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → request.rs (request ID, tracing span)
//!     → guard (role check on navigable paths)
//!     → proxy handlers (API → backend, pages → page origin)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod state;

pub use request::X_REQUEST_ID;
pub use server::EdgeServer;
pub use state::{AppState, EdgeRuntime};
