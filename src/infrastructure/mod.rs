//! Infrastructure layer - external adapters (config files, scripts, systemd).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod apply;
pub mod config;
pub mod script;
pub mod systemd;

pub use apply::ApplyExecutor;
pub use config::load_config;
pub use script::{run_script, script_path, NETWORK_SCRIPT};
pub use systemd::{DryRunManager, ServiceManager, SystemdManager};
