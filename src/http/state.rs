//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::env::DEFAULT_BACKEND_URL;
use crate::config::EdgeConfig;
use crate::guard::policy::GuardPolicy;
use crate::guard::session::{SessionEndpoint, SessionResolver};
use crate::proxy::{Forwarder, UpstreamTarget};

/// Everything compiled from one validated config.
#[derive(Debug)]
pub struct EdgeRuntime {
    pub api_target: UpstreamTarget,
    pub pages_target: Option<UpstreamTarget>,
    pub forwarder: Forwarder,
    pub guard: GuardPolicy,
    pub session_endpoint: SessionEndpoint,
}

impl EdgeRuntime {
    pub fn from_config(config: &EdgeConfig, client: reqwest::Client) -> Self {
        let backend = config.backend.base_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL);

        Self {
            api_target: UpstreamTarget::api(backend, &config.backend.api_prefix),
            pages_target: config.pages.origin_url.as_deref().map(UpstreamTarget::pages),
            forwarder: Forwarder::new(
                client,
                config.proxy.trust_forwarded_proto,
                Duration::from_secs(config.timeouts.upstream_secs),
            ),
            guard: GuardPolicy::from_config(&config.guard),
            session_endpoint: SessionEndpoint::new(
                backend,
                &config.guard.session_path,
                Duration::from_secs(config.timeouts.session_check_secs),
            ),
        }
    }
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    runtime: Arc<ArcSwap<EdgeRuntime>>,
    client: reqwest::Client,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(config: &EdgeConfig, client: reqwest::Client, sessions: Arc<dyn SessionResolver>) -> Self {
        let runtime = EdgeRuntime::from_config(config, client.clone());
        Self {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
            client,
            sessions,
        }
    }

    /// Current runtime snapshot. Stays valid for the whole request even if
    /// a reload happens meanwhile.
    pub fn runtime(&self) -> Arc<EdgeRuntime> {
        self.runtime.load_full()
    }

    /// Swap in a runtime compiled from a newly validated config.
    pub fn apply_config(&self, config: &EdgeConfig) {
        let runtime = EdgeRuntime::from_config(config, self.client.clone());
        tracing::info!(
            rules = runtime.guard.table().len(),
            session_url = %runtime.session_endpoint.url,
            "Configuration applied"
        );
        self.runtime.store(Arc::new(runtime));
    }
}
