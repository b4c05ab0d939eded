//! cloudinit-watcher - apply legacy provisioning files as cloud-config.
//!
//! Watches a handful of legacy files (`/etc/conf.d/net`, root's
//! `authorized_keys`, `/etc/shadow`, `/etc/conf.d/hostname`) under a watch
//! root. Whenever one appears it is translated into a cloud-config document
//! and a transient systemd unit is started to apply it.
//!
//!   cloudinit-watcher --watch-dir /mnt/guest --scripts-dir /usr/lib/watcher
//!   cloudinit-watcher -c /etc/cloudinit-watcher.toml -v

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::thread;

use clap::Parser;
use colored::Colorize;
use tokio::sync::oneshot;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{HandlerRegistry, Reconciler, WatchController};
use cli::Cli;
use domain::{AppError, Result};
use infrastructure::{load_config, ApplyExecutor, DryRunManager, ServiceManager, SystemdManager};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let watch_root = std::path::absolute(&config.watch.dir).map_err(|e| {
        AppError::io(
            format!("Failed to resolve watch dir {}", config.watch.dir.display()),
            e,
        )
    })?;

    let manager: Box<dyn ServiceManager> = if config.apply.dry_run {
        tracing::warn!("Dry run enabled, transient units will not be started");
        Box::new(DryRunManager)
    } else {
        Box::new(SystemdManager::new())
    };

    let executor = ApplyExecutor::new(manager, &config.apply, config.temp_dir());
    let reconciler = Reconciler::new(
        HandlerRegistry::default(),
        watch_root,
        config.watch.scripts_dir.clone(),
        executor,
    );
    let mut controller = WatchController::new(reconciler)?;

    // The watch loop blocks on the notify channel.
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("watch".into())
        .spawn(move || {
            controller.start();
            let _ = done_tx.send(controller.run());
        })
        .map_err(|e| AppError::io("Failed to spawn watch thread", e))?;

    tokio::select! {
        result = done_rx => match result {
            Ok(Err(e)) => {
                tracing::error!("Watching stopped: {e}");
                Err(e)
            }
            Ok(Ok(())) => Ok(()),
            Err(_) => Err(AppError::Watch(notify::Error::generic(
                "watch thread exited unexpectedly",
            ))),
        },
        () = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            Ok(())
        }
    }
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
