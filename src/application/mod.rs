//! Application layer - translation and reconciliation.
//!
//! This layer decides which legacy files matter, turns them into
//! cloud-config documents and drives the watch loop.

pub mod handlers;
pub mod reconciler;
pub mod registry;
pub mod watcher;

pub use reconciler::Reconciler;
pub use registry::HandlerRegistry;
pub use watcher::WatchController;
