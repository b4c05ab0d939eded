//! Runtime configuration model.
//!
//! Values come from an optional TOML file and are overridden by CLI flags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where legacy files live and where helper scripts are found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Root that the logical legacy paths are resolved under.
    #[serde(default = "default_watch_dir")]
    pub dir: PathBuf,

    /// Directory containing `gentoo-to-networkd` and friends.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: default_watch_dir(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("./scripts")
}

/// How rendered documents are handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Configuration-apply tool invoked with `--from-file`.
    #[serde(default = "default_tool")]
    pub tool: PathBuf,

    /// Directory for rendered documents (system temp dir if unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// File name prefix for rendered documents.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Description attached to each transient unit.
    #[serde(default = "default_description")]
    pub description: String,

    /// Render documents but never contact the service manager.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            temp_dir: None,
            temp_prefix: default_temp_prefix(),
            description: default_description(),
            dry_run: false,
        }
    }
}

fn default_tool() -> PathBuf {
    PathBuf::from("/usr/bin/coreos-cloudinit")
}

fn default_temp_prefix() -> String {
    "rackspace-cloudinit-".into()
}

fn default_description() -> String {
    "Unit generated and executed by coreos-cloudinit on behalf of user".into()
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Watch configuration.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Apply configuration.
    #[serde(default)]
    pub apply: ApplyConfig,
}

impl AppConfig {
    /// Directory rendered documents are written to.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.apply
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
