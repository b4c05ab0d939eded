//! Systemd service manager integration.
//!
//! Starts transient units through the systemd D-Bus API, the same call
//! `systemd-run` makes.

use zbus::blocking::Connection;
use zbus::zvariant::Value;

use crate::domain::{AppError, Result, TransientUnitRequest};

const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
const SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";
const SYSTEMD_MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";

/// Anything that can start a transient unit on our behalf.
pub trait ServiceManager: Send + Sync {
    /// Submit the request. Success means the job was queued, not that the
    /// command ran.
    ///
    /// # Errors
    /// Returns error if the submission is rejected or cannot be delivered.
    fn start_transient_unit(&self, request: &TransientUnitRequest) -> Result<()>;
}

impl<T: ServiceManager + ?Sized> ServiceManager for Box<T> {
    fn start_transient_unit(&self, request: &TransientUnitRequest) -> Result<()> {
        (**self).start_transient_unit(request)
    }
}

/// Service manager backed by the system bus.
#[derive(Debug, Default)]
pub struct SystemdManager;

impl SystemdManager {
    /// Create a new systemd service manager.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ServiceManager for SystemdManager {
    fn start_transient_unit(&self, request: &TransientUnitRequest) -> Result<()> {
        let (program, _) = request
            .command
            .split_first()
            .ok_or_else(|| AppError::ServiceManager {
                message: format!("empty command line for {}", request.name),
                source: None,
            })?;

        let connection = Connection::system()
            .map_err(|e| AppError::service_manager("Failed to connect to the system bus", e))?;

        // ExecStart is a(sasb): executable, argv (including argv[0]), ignore-failure.
        let exec_start = vec![(program.clone(), request.command.clone(), false)];
        let properties: Vec<(&str, Value<'_>)> = vec![
            ("Description", Value::from(request.description.as_str())),
            ("ExecStart", Value::from(exec_start)),
        ];
        let aux: Vec<(&str, Vec<(&str, Value<'_>)>)> = Vec::new();

        connection
            .call_method(
                Some(SYSTEMD_DESTINATION),
                SYSTEMD_PATH,
                Some(SYSTEMD_MANAGER_INTERFACE),
                "StartTransientUnit",
                &(
                    request.name.as_str(),
                    request.mode.as_str(),
                    properties,
                    aux,
                ),
            )
            .map_err(|e| {
                AppError::service_manager(
                    format!("Failed to start transient unit {}", request.name),
                    e,
                )
            })?;

        tracing::info!(unit = %request.name, mode = %request.mode, "Transient unit started");

        Ok(())
    }
}

/// Service manager that only logs what it would have started.
#[derive(Debug, Default)]
pub struct DryRunManager;

impl ServiceManager for DryRunManager {
    fn start_transient_unit(&self, request: &TransientUnitRequest) -> Result<()> {
        tracing::info!(
            unit = %request.name,
            mode = %request.mode,
            command = %request.command.join(" "),
            "Dry run: transient unit not started"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::ServiceManager;
    use crate::domain::{AppError, Result, TransientUnitRequest};

    /// Records every submission; optionally rejects them.
    #[derive(Debug, Default)]
    pub struct RecordingManager {
        pub requests: Mutex<Vec<TransientUnitRequest>>,
        pub reject: bool,
    }

    impl RecordingManager {
        pub fn rejecting() -> Self {
            Self {
                requests: Mutex::default(),
                reject: true,
            }
        }

        pub fn requests(&self) -> Vec<TransientUnitRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ServiceManager for RecordingManager {
        fn start_transient_unit(&self, request: &TransientUnitRequest) -> Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            if self.reject {
                return Err(AppError::ServiceManager {
                    message: "rejected".into(),
                    source: None,
                });
            }
            Ok(())
        }
    }
}
