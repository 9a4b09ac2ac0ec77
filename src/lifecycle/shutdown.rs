//! Shutdown coordination for the edge.
//!
//! A trigger is latched: tasks that subscribe after the stop signal still
//! see it, so a SIGTERM that lands during startup is not lost.

use tokio::sync::watch;

/// Owner side of the edge's stop signal. Clones share one latch.
#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// One task's view of the stop signal.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    /// Fire the signal. Later calls are no-ops.
    pub fn trigger(&self) {
        let first = self.tx.send_if_modified(|stopping| !std::mem::replace(stopping, true));
        if first {
            tracing::info!(tasks = self.tx.receiver_count(), "Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered, immediately if it already was.
    ///
    /// Also resolves if every [`Shutdown`] handle is dropped, since nothing
    /// could trigger it any more.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}
