//! Watch controller: subscribes to the parent directories of every registered
//! file and reconciles files as they are created.
//!
//! Events are handled one at a time, in delivery order, on the caller's
//! thread. Handler failures are logged and monitoring continues; a failure of
//! the notification backend itself ends the loop with an error.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::domain::{AppError, Result};
use crate::infrastructure::ServiceManager;

use super::reconciler::{Outcome, Reconciler};

/// Owns the notify watcher and the reconciler it feeds.
pub struct WatchController<M> {
    reconciler: Reconciler<M>,
    watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

impl<M: ServiceManager> WatchController<M> {
    /// Create a controller with the platform's recommended backend.
    ///
    /// # Errors
    /// Returns error if the notification backend cannot be initialized.
    pub fn new(reconciler: Reconciler<M>) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;
        Ok(Self {
            reconciler,
            watcher,
            events,
        })
    }

    /// Subscribe to every watch directory, then reconcile every registered
    /// file once.
    ///
    /// Directories that cannot be watched (usually because they do not exist
    /// yet) are logged and skipped.
    pub fn start(&mut self) {
        let root = self.reconciler.watch_root().to_path_buf();
        let dirs = self.reconciler.registry().watch_dirs(&root);

        if self.reconciler.registry().is_empty() {
            tracing::warn!("No files registered, nothing to watch");
        }

        for dir in &dirs {
            match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => tracing::debug!(dir = %dir.display(), "Watching directory"),
                Err(e) => tracing::warn!(
                    dir = %dir.display(),
                    "Failed to watch directory (does it exist?): {e}"
                ),
            }
        }

        tracing::info!(
            files = self.reconciler.registry().len(),
            dirs = dirs.len(),
            root = %root.display(),
            "Monitoring"
        );

        let applied = self.reconciler.sweep();
        tracing::info!(applied, "Initial reconciliation complete");
    }

    /// Process events until the backend fails or the channel closes.
    ///
    /// # Errors
    /// Returns the backend error that stopped monitoring.
    pub fn run(self) -> Result<()> {
        // Keep the watcher alive for as long as we receive from it.
        let Self {
            reconciler,
            watcher: _watcher,
            events,
        } = self;

        for event in &events {
            let event = event?;
            handle_event(&reconciler, &event);
        }

        Err(AppError::Watch(notify::Error::generic(
            "file notification channel closed",
        )))
    }
}

/// Reconcile the paths of a creation event; ignore everything else.
fn handle_event<M: ServiceManager>(reconciler: &Reconciler<M>, event: &Event) {
    let created = created_paths(event);
    if created.is_empty() {
        tracing::trace!(kind = ?event.kind, paths = ?event.paths, "Ignoring event");
        return;
    }

    for path in created {
        tracing::debug!(path = %path.display(), "File created");
        report(path, reconciler.reconcile(path));
    }
}

/// Paths that newly appeared. A file renamed into place counts as created,
/// since that is how most tools write a file atomically.
///
/// A rename inside a watched directory is also reported as a paired
/// `Name(Both)` event; only the `Name(To)` half is taken so each rename is
/// reconciled once.
fn created_paths(event: &Event) -> &[PathBuf] {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            &event.paths
        }
        _ => &[],
    }
}

fn report(path: &Path, result: Result<Outcome>) {
    match result {
        Ok(Outcome::Applied { handler }) => {
            tracing::info!(path = %path.display(), handler, "Apply requested");
        }
        Ok(Outcome::Unregistered { logical }) => {
            tracing::info!(path = %path.display(), ?logical, "No handler found");
        }
        Ok(Outcome::Missing) => {}
        Err(e) => tracing::error!(path = %path.display(), "Error handling event: {e}"),
    }
}
