//! CLI interface using clap.
//!
//! Provides the command-line flags for the watcher daemon.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::AppConfig;

/// Watches legacy provisioning files and applies them as cloud-config.
#[derive(Parser, Debug)]
#[command(name = "cloudinit-watcher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to watch [default: .]
    #[arg(long = "watch-dir")]
    pub watch_dir: Option<PathBuf>,

    /// Path for supporting shell scripts [default: ./scripts]
    #[arg(long = "scripts-dir")]
    pub scripts_dir: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Apply flags given on the command line over file configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.watch_dir {
            config.watch.dir.clone_from(dir);
        }
        if let Some(dir) = &self.scripts_dir {
            config.watch.scripts_dir.clone_from(dir);
        }
    }
}
