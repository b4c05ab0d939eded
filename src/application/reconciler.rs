//! Reconciliation: changed file in, apply request out.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};
use crate::infrastructure::{ApplyExecutor, ServiceManager};

use super::registry::{logical_path, HandlerRegistry};

/// What a reconciliation pass did with a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file does not exist (yet).
    Missing,
    /// The file is not one we translate.
    Unregistered { logical: Option<PathBuf> },
    /// A document was rendered and its application requested.
    Applied { handler: &'static str },
}

/// Resolves a path to its handler and pushes the result to the host.
pub struct Reconciler<M> {
    registry: HandlerRegistry,
    watch_root: PathBuf,
    scripts_dir: PathBuf,
    executor: ApplyExecutor<M>,
}

impl<M: ServiceManager> Reconciler<M> {
    /// Create a reconciler.
    pub const fn new(
        registry: HandlerRegistry,
        watch_root: PathBuf,
        scripts_dir: PathBuf,
        executor: ApplyExecutor<M>,
    ) -> Self {
        Self {
            registry,
            watch_root,
            scripts_dir,
            executor,
        }
    }

    /// The registry this reconciler resolves against.
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Root directory the logical paths live under.
    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    #[cfg(test)]
    pub const fn executor(&self) -> &ApplyExecutor<M> {
        &self.executor
    }

    /// Translate and apply the file at `path`.
    ///
    /// Missing and unregistered files are not errors.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, its handler fails, or the
    /// document cannot be applied.
    pub fn reconcile(&self, path: &Path) -> Result<Outcome> {
        match fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "File does not exist, skipping");
                return Ok(Outcome::Missing);
            }
            Err(e) => {
                return Err(AppError::io(format!("Failed to stat {}", path.display()), e));
            }
        }

        let logical = logical_path(&self.watch_root, path);
        let Some(handler) = logical.as_deref().and_then(|l| self.registry.lookup(l)) else {
            return Ok(Outcome::Unregistered { logical });
        };
        let logical = logical.unwrap_or_else(|| path.to_path_buf());

        let raw = fs::read(path)
            .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))?;
        let content = String::from_utf8_lossy(&raw);

        tracing::info!(path = %logical.display(), %handler, "Translating");
        let config = handler
            .translate(&content, &self.scripts_dir)
            .map_err(|source| AppError::Handler {
                handler: handler.name(),
                path: logical.clone(),
                source,
            })?;

        if config.is_empty() {
            tracing::debug!(path = %logical.display(), %handler, "Nothing to configure");
        }
        self.executor.apply(config)?;

        Ok(Outcome::Applied {
            handler: handler.name(),
        })
    }

    /// Run one pass over every registered file, logging failures.
    ///
    /// Returns the number of files that were applied.
    pub fn sweep(&self) -> usize {
        let mut applied = 0;
        for path in self.registry.physical_paths(&self.watch_root) {
            match self.reconcile(&path) {
                Ok(Outcome::Applied { .. }) => applied += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Initial reconciliation failed: {e}");
                }
            }
        }
        applied
    }
}
