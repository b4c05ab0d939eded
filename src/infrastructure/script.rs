//! Helper script execution.
//!
//! Runs a translation script with the legacy file on stdin and collects
//! whatever it prints.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::domain::HandlerError;

/// Script that turns a gentoo `conf.d/net` file into a networkd unit.
pub const NETWORK_SCRIPT: &str = "gentoo-to-networkd";

/// Run `script arg` with `input` on stdin and return its stdout.
///
/// stdin is written from a separate thread so a script that starts printing
/// before it has consumed all input cannot deadlock on a full pipe.
///
/// # Errors
/// Returns error if the script cannot be spawned, the pipes fail, or it exits
/// with a non-zero status.
pub fn run_script(script: &Path, arg: &str, input: &[u8]) -> Result<String, HandlerError> {
    let io_error = |source| HandlerError::ScriptIo {
        script: script.to_path_buf(),
        source,
    };

    let mut child = Command::new(script)
        .arg(arg)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| HandlerError::ScriptSpawn {
            script: script.to_path_buf(),
            source,
        })?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        io_error(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdin not captured",
        ))
    })?;
    let input = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&input));

    let output = child.wait_with_output().map_err(io_error)?;

    match writer.join() {
        Ok(Ok(())) => {}
        // The script may legitimately exit without reading everything.
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::debug!(script = %script.display(), "script closed stdin early");
        }
        Ok(Err(e)) => return Err(io_error(e)),
        Err(_) => {
            return Err(io_error(std::io::Error::other("stdin writer panicked")));
        }
    }

    if !output.status.success() {
        return Err(HandlerError::ScriptFailed {
            script: script.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Location of a named script inside the scripts directory.
#[must_use]
pub fn script_path(scripts_dir: &Path, name: &str) -> PathBuf {
    scripts_dir.join(name)
}


#[cfg(all(test, unix))]
mod tests {
    use super::test_support::write_script;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stdin_and_argument_reach_script() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "echo-args", r#"echo "if=$1"; cat"#);

        let out = run_script(&script, "eth0", b"config_eth0=\"dhcp\"\n").unwrap();

        assert_eq!(out, "if=eth0\nconfig_eth0=\"dhcp\"\n");
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "fail", "echo boom >&2; exit 3");

        let err = run_script(&script, "eth0", b"").unwrap_err();

        match err {
            HandlerError::ScriptFailed { stderr, status, .. } => {
                assert_eq!(stderr, "boom");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_script_is_spawn_error() {
        let dir = tempdir().unwrap();
        let err = run_script(&dir.path().join("nope"), "eth0", b"").unwrap_err();
        assert!(matches!(err, HandlerError::ScriptSpawn { .. }));
    }

    #[test]
    fn test_script_ignoring_stdin_succeeds() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "ignore", "echo done");
        let input = vec![b'x'; 1 << 20];

        let out = run_script(&script, "eth0", &input).unwrap();

        assert_eq!(out, "done\n");
    }
}
