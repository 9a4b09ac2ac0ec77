//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the API proxy route and page fallback
//! - Wire up middleware (request ID, tracing, role guard)
//! - Apply config reloads without dropping connections
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::watcher::ReloadScope;
use crate::config::EdgeConfig;
use crate::guard::role_guard_middleware;
use crate::guard::session::{BackendSessionResolver, SessionResolver};
use crate::http::request::{make_request_span, UuidRequestId, X_REQUEST_ID};
use crate::http::state::AppState;
use crate::lifecycle::ShutdownSignal;
use crate::proxy::{build_upstream_client, handlers};

/// HTTP server for the storefront edge.
pub struct EdgeServer {
    router: Router,
    state: AppState,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a server that resolves sessions against the configured backend.
    pub fn new(config: EdgeConfig) -> Result<Self, reqwest::Error> {
        let client = build_upstream_client()?;
        let sessions = Arc::new(BackendSessionResolver::new(client.clone()));
        Ok(Self::with_session_resolver(config, client, sessions))
    }

    /// Create a server with a custom session resolver.
    pub fn with_session_resolver(
        config: EdgeConfig,
        client: reqwest::Client,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        let state = AppState::new(&config, client, sessions);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        let api_prefix = config.backend.api_prefix.trim_end_matches('/');
        let api_wildcard = format!("{}/{{*path}}", api_prefix);

        Router::new()
            .route(api_prefix, any(handlers::api_proxy))
            .route(&api_wildcard, any(handlers::api_proxy))
            .fallback(handlers::pages)
            .layer(middleware::from_fn_with_state(state.clone(), role_guard_middleware))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configs arriving on `config_updates` are applied in place.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.state.runtime().guard.table().len(),
            "HTTP server starting"
        );

        // The listener and router are built; their settings stay put
        let state = self.state.clone();
        let scope = ReloadScope::from_config(&self.config);
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply_config(&scope.restrict(config));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
