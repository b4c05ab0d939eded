//! Registry of legacy files and the handler responsible for each.
//!
//! Keys are logical absolute paths (`/etc/shadow`), independent of where the
//! watch root physically lives. The registry is built once and never changes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use super::handlers::Handler;

/// Files watched by default, with their handlers.
const DEFAULT_HANDLERS: &[(&str, Handler)] = &[
    ("/etc/conf.d/net", Handler::Network),
    ("/root/.ssh/authorized_keys", Handler::SshKeys),
    ("/etc/shadow", Handler::Shadow),
    ("/etc/conf.d/hostname", Handler::Hostname),
];

/// Immutable map from logical path to handler.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<PathBuf, Handler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::from_entries(
            DEFAULT_HANDLERS
                .iter()
                .map(|(path, handler)| (PathBuf::from(path), *handler)),
        )
    }
}

impl HandlerRegistry {
    /// Build a registry from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (PathBuf, Handler)>) -> Self {
        Self {
            handlers: entries.into_iter().collect(),
        }
    }

    /// Exact-match lookup of a logical path.
    #[must_use]
    pub fn lookup(&self, logical: &Path) -> Option<Handler> {
        self.handlers.get(logical).copied()
    }

    /// Logical paths in the registry.
    pub fn logical_paths(&self) -> impl Iterator<Item = &Path> {
        self.handlers.keys().map(PathBuf::as_path)
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Physical location of every registered file under `watch_root`.
    #[must_use]
    pub fn physical_paths(&self, watch_root: &Path) -> Vec<PathBuf> {
        self.logical_paths()
            .map(|logical| physical_path(watch_root, logical))
            .collect()
    }

    /// Parent directories to subscribe to, deduplicated.
    #[must_use]
    pub fn watch_dirs(&self, watch_root: &Path) -> BTreeSet<PathBuf> {
        self.physical_paths(watch_root)
            .iter()
            .filter_map(|path| path.parent().map(Path::to_path_buf))
            .collect()
    }
}

/// Where a logical path lives under `watch_root`.
#[must_use]
pub fn physical_path(watch_root: &Path, logical: &Path) -> PathBuf {
    watch_root.join(logical.strip_prefix("/").unwrap_or(logical))
}

/// Make `path` relative to `watch_root` and re-root it at `/`.
///
/// Returns `None` for paths outside the watch root. Both sides are compared
/// lexically after dropping `.` components, so `./etc/shadow` under root `.`
/// resolves to `/etc/shadow`.
#[must_use]
pub fn logical_path(watch_root: &Path, path: &Path) -> Option<PathBuf> {
    let root = normalize(watch_root);
    let path = normalize(path);
    let relative = path.strip_prefix(&root).ok()?;
    Some(Path::new("/").join(relative))
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
