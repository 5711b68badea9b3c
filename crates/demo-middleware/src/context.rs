//! Process-wide middleware context.
//!
//! A [`Context`] is created once per process (or per test), handed to every
//! [`Node`][crate::Node], and shut down exactly when the program should stop:
//! on Ctrl-C, when a node asks for it (`-h`, a finished client), or when the
//! container exits.  Every blocking wait in the middleware also watches the
//! shutdown signal so nothing outlives it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::graph::Graph;

/// Cheap to clone; all clones share the same shutdown state and graph.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    shutdown: watch::Sender<bool>,
    graph: Graph,
}

impl Context {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                shutdown,
                graph: Graph::new(),
            }),
        }
    }

    /// `true` until [`shutdown`][Self::shutdown] has been called.
    pub fn ok(&self) -> bool {
        !*self.inner.shutdown.borrow()
    }

    /// Request shutdown.  Idempotent, and safe to call from a signal handler
    /// thread.
    pub fn shutdown(&self) {
        let was_stopped = self.inner.shutdown.send_replace(true);
        if !was_stopped {
            debug!("context shutdown requested");
        }
    }

    /// Resolve once shutdown has been requested (immediately if it already
    /// was).
    pub async fn shutdown_requested(&self) {
        let mut rx = self.inner.shutdown.subscribe();
        // The sender lives as long as `self`, so this only returns once the
        // flag is set.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// The registry shared by every node created on this context.
    pub fn graph(&self) -> &Graph {
        &self.inner.graph
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
