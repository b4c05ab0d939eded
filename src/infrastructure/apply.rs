//! Hands rendered cloud-configs to the host.
//!
//! Each document is written to a fresh temp file which is left on disk, then
//! a transient unit running the apply tool against that file is requested.
//! The unit runs asynchronously; we never learn whether the tool succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, ApplyConfig, CloudConfig, JobMode, Result, TransientUnitRequest};

use super::systemd::ServiceManager;

/// Writes documents and requests their application.
pub struct ApplyExecutor<M> {
    manager: M,
    tool: PathBuf,
    temp_dir: PathBuf,
    temp_prefix: String,
    description: String,
}

impl<M: ServiceManager> ApplyExecutor<M> {
    /// Create an executor from the apply configuration.
    pub fn new(manager: M, config: &ApplyConfig, temp_dir: PathBuf) -> Self {
        Self {
            manager,
            tool: config.tool.clone(),
            temp_dir,
            temp_prefix: config.temp_prefix.clone(),
            description: config.description.clone(),
        }
    }

    #[cfg(test)]
    pub const fn manager(&self) -> &M {
        &self.manager
    }

    /// Render `config`, persist it and request a transient apply unit.
    ///
    /// # Errors
    /// Returns error if rendering, writing, or submitting the unit fails.
    pub fn apply(&self, config: CloudConfig) -> Result<()> {
        let rendered = config.render()?;
        let path = self.write_document(&rendered)?;
        tracing::info!(path = %path.display(), "Rendered cloud-config written");

        let request = self.request_for(&path)?;
        tracing::info!(unit = %request.name, "Creating transient systemd unit");

        self.manager.start_transient_unit(&request)
    }

    /// Write to a uniquely named file that outlives this process.
    fn write_document(&self, rendered: &str) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.temp_prefix)
            .tempfile_in(&self.temp_dir)
            .map_err(|e| {
                AppError::io(
                    format!("Failed to create temp file in {}", self.temp_dir.display()),
                    e,
                )
            })?;

        file.write_all(rendered.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| AppError::io("Failed to write cloud-config", e))?;

        let (_, path) = file
            .keep()
            .map_err(|e| AppError::io("Failed to persist cloud-config", e.error))?;

        Ok(path)
    }

    fn request_for(&self, document: &Path) -> Result<TransientUnitRequest> {
        let file_name = document
            .file_name()
            .ok_or_else(|| AppError::Config {
                message: format!("temp file has no name: {}", document.display()),
            })?
            .to_string_lossy();

        Ok(TransientUnitRequest {
            name: format!("{file_name}.service"),
            description: self.description.clone(),
            command: vec![
                self.tool.display().to_string(),
                "--from-file".into(),
                document.display().to_string(),
            ],
            mode: JobMode::Replace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::systemd::test_support::RecordingManager;
    use std::fs;
    use tempfile::tempdir;

    fn executor(dir: &Path, manager: RecordingManager) -> ApplyExecutor<RecordingManager> {
        ApplyExecutor::new(manager, &ApplyConfig::default(), dir.to_path_buf())
    }

    #[test]
    fn test_apply_writes_document_and_requests_unit() {
        let dir = tempdir().unwrap();
        let executor = executor(dir.path(), RecordingManager::default());
        let config = CloudConfig {
            hostname: Some("my-host".into()),
            ..Default::default()
        };

        executor.apply(config).unwrap();

        let requests = executor.manager().requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.mode, JobMode::Replace);
        assert_eq!(request.command[0], "/usr/bin/coreos-cloudinit");
        assert_eq!(request.command[1], "--from-file");

        let document = PathBuf::from(&request.command[2]);
        assert!(document.starts_with(dir.path()));
        let file_name = document.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("rackspace-cloudinit-"));
        assert_eq!(request.name, format!("{file_name}.service"));

        let written = fs::read_to_string(&document).unwrap();
        assert!(written.starts_with("#cloud-config\n"));
        assert!(written.contains("hostname: my-host"));
    }

    #[test]
    fn test_each_apply_gets_its_own_file() {
        let dir = tempdir().unwrap();
        let executor = executor(dir.path(), RecordingManager::default());

        executor.apply(CloudConfig::default()).unwrap();
        executor.apply(CloudConfig::default()).unwrap();

        let requests = executor.manager().requests();
        assert_ne!(requests[0].name, requests[1].name);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_rejected_submission_is_returned() {
        let dir = tempdir().unwrap();
        let executor = executor(dir.path(), RecordingManager::rejecting());

        let result = executor.apply(CloudConfig::default());

        assert!(matches!(result, Err(AppError::ServiceManager { .. })));
        // The document stays behind for inspection.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_temp_dir_fails_before_submission() {
        let dir = tempdir().unwrap();
        let executor = executor(&dir.path().join("gone"), RecordingManager::default());

        let result = executor.apply(CloudConfig::default());

        assert!(matches!(result, Err(AppError::Io { .. })));
        assert!(executor.manager().requests().is_empty());
    }
}
