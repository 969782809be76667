//! Shutdown fan-out for the toggle service.
//!
//! `startup::run` owns one `Shutdown`. The flag poller and the HTTP server
//! each subscribe before they start; SIGINT/SIGTERM (or a test) triggers it,
//! the poller stops fetching flags and the server drains in-flight toggle
//! requests.

use tokio::sync::broadcast;

/// Broadcasts the stop signal to the flag poller and the HTTP server.
///
/// Offline and file-backed flag clients hold no receiver; their watcher is
/// dropped with the client.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for one background task: the poller or the server.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Triggering with no subscribers left is a no-op.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of background tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
