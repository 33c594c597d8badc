//! Route file watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::loader::{FileSource, RouteSource};
use crate::routing::router::Router;

/// Outcome of a reload triggered by a file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The table was rebuilt and now holds `routes` routes.
    Reloaded { routes: usize },
    /// Reload failed; the previous table is still live.
    Failed(String),
}

/// Reload `router` if any source changed since its last load.
///
/// Returns `None` when nothing changed.
pub fn reload_if_changed<S: RouteSource>(router: &Router, sources: &[S]) -> Option<ReloadEvent> {
    match router.detect_changes(sources) {
        Ok(true) => {
            let routes = router.len();
            tracing::info!(routes, "Routes reloaded");
            Some(ReloadEvent::Reloaded { routes })
        }
        Ok(false) => None,
        Err(e) => {
            tracing::error!("Failed to reload routes: {}. Keeping current routes.", e);
            Some(ReloadEvent::Failed(e.to_string()))
        }
    }
}

/// A watcher that reloads the router when one of its route files changes.
pub struct RouteWatcher {
    router: Arc<Router>,
    sources: Arc<Vec<FileSource>>,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl RouteWatcher {
    /// Create a new RouteWatcher.
    ///
    /// Returns the watcher and a receiver for reload events.
    pub fn new(
        router: Arc<Router>,
        sources: Vec<FileSource>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                router,
                sources: Arc::new(sources),
                poll_interval,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching every source file on notify's background thread.
    ///
    /// Watching stops when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let router = Arc::clone(&self.router);
        let sources = Arc::clone(&self.sources);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::debug!(paths = ?event.paths, "Route file change detected");
                        if let Some(outcome) = reload_if_changed(&router, sources.as_slice()) {
                            let _ = tx.send(outcome);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        let paths: Vec<PathBuf> = self
            .sources
            .iter()
            .filter_map(|source| source.path().map(PathBuf::from))
            .collect();
        for path in &paths {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(files = paths.len(), "Route watcher started");
        Ok(watcher)
    }
}
