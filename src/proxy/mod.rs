//! Reverse-proxy subsystem.
//!
//! # Data Flow
//! ```text
//! /api, /api/* ──▶ handlers::api_proxy ──┐
//! allowed pages ──▶ handlers::pages ─────┤
//!                                        ▼
//!                      target.rs (base + prefix + raw path + query)
//!                      headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!                      forward.rs (stream body, no redirects)
//!                                        │
//!                      headers.rs (relay headers, one Set-Cookie each)
//!                                        ▼
//!                                  caller response
//! ```

pub mod forward;
pub mod handlers;
pub mod headers;
pub mod target;

pub use forward::{build_upstream_client, Forwarder};
pub use target::UpstreamTarget;
