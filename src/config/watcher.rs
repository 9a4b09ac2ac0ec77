//! Hot reload of the config file.
//!
//! # Design Decisions
//! - The parent directory is watched and events are filtered by file name,
//!   so editors that save through a temp file and rename keep reloading
//! - Only validated configs are sent; a broken edit leaves the running
//!   config in place
//! - The bind address and API prefix are fixed by the listener and router
//!   at startup; reloads keep the running values (see [`ReloadScope`])

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::EdgeConfig;

/// Settings a running edge cannot change without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadScope {
    bind_address: String,
    api_prefix: String,
}

impl ReloadScope {
    pub fn from_config(running: &EdgeConfig) -> Self {
        Self {
            bind_address: running.listener.bind_address.clone(),
            api_prefix: running.backend.api_prefix.clone(),
        }
    }

    /// Keep the running restart-only settings in `config`.
    ///
    /// Returns the names of the fields the new config tried to change.
    pub fn pin(&self, config: &mut EdgeConfig) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if config.listener.bind_address != self.bind_address {
            ignored.push("listener.bind_address");
            config.listener.bind_address = self.bind_address.clone();
        }
        if config.backend.api_prefix != self.api_prefix {
            ignored.push("backend.api_prefix");
            config.backend.api_prefix = self.api_prefix.clone();
        }
        ignored
    }

    /// [`pin`](Self::pin), warning about every ignored change.
    pub fn restrict(&self, mut config: EdgeConfig) -> EdgeConfig {
        for field in self.pin(&mut config) {
            tracing::warn!(field, "Change ignored until restart");
        }
        config
    }
}

/// Watches one config file and sends validated updates.
pub struct ConfigWatcher {
    path: PathBuf,
    scope: ReloadScope,
    update_tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl ConfigWatcher {
    /// `running` is the config the edge started with.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path, running: &EdgeConfig) -> (Self, mpsc::UnboundedReceiver<EdgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            scope: ReloadScope::from_config(running),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;

        let Self { path, scope, update_tx } = self;
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &file_name) => reload(&path, &scope, &update_tx),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Config watch error"),
        };

        let mut watcher = RecommendedWatcher::new(handler, Config::default().with_poll_interval(Duration::from_secs(2)))?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(directory = %directory.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Whether `event` may have changed the watched file's contents.
fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, scope: &ReloadScope, update_tx: &mpsc::UnboundedSender<EdgeConfig>) {
    match load_config(Some(path)) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Config reloaded");
            let _ = update_tx.send(scope.restrict(config));
        }
        Err(e) => tracing::error!(path = %path.display(), error = %e, "Config reload rejected, keeping current configuration"),
    }
}
