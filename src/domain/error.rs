//! Domain-level error types for cloudinit-watcher.
//!
//! All errors are typed with `thiserror`. Only [`AppError::Watch`] is fatal;
//! everything else is scoped to a single reconciliation and gets logged.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures raised while translating a legacy file into a cloud-config.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The translation script could not be started.
    #[error("failed to start {script}: {source}")]
    ScriptSpawn {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Feeding the script or collecting its output failed.
    #[error("I/O with {script} failed: {source}")]
    ScriptIo {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script ran but exited unsuccessfully.
    #[error("{script} exited with {status}: {stderr}")]
    ScriptFailed {
        script: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    /// The shadow file has no usable root entry.
    #[error("unable to parse password hash from shadow")]
    MissingPasswordHash,
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// A translation handler rejected its input.
    #[error("{handler} handler failed for {path}: {source}")]
    Handler {
        handler: &'static str,
        path: PathBuf,
        #[source]
        source: HandlerError,
    },

    /// Rendering a cloud-config document failed.
    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    /// The service manager refused or could not receive a transient unit.
    #[error("Service manager error: {message}")]
    ServiceManager {
        message: String,
        #[source]
        source: Option<zbus::Error>,
    },

    /// The file notification subsystem failed; monitoring cannot continue.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a render error from a YAML serialization failure.
    pub fn render(err: serde_yaml::Error) -> Self {
        Self::Render {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a service manager error from a D-Bus failure.
    pub fn service_manager(message: impl Into<String>, err: zbus::Error) -> Self {
        Self::ServiceManager {
            message: format!("{}: {err}", message.into()),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
