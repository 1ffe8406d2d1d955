//! Native process controller.
//!
//! Writes the configuration body into the daemon's working directory,
//! spawns the daemon binary there and stops it with SIGTERM, escalating to
//! SIGKILL after the stop timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use logprobe_core::Dialect;
use logprobe_core::config::DaemonSection;
use tokio::process::{Child, Command};

use crate::controller::ProcessController;
use crate::error::{ControlError, Result};

#[cfg(unix)]
use nix::sys::signal::{Signal, kill};
#[cfg(unix)]
use nix::unistd::Pid;

/// Interval between liveness/readiness checks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Without a readiness marker the daemon counts as started once it has
/// survived this long.
const STARTUP_GRACE: Duration = Duration::from_millis(200);

/// Spawns the real daemon binary.
#[derive(Debug)]
pub struct DaemonController {
    section: DaemonSection,
    child: Option<Child>,
}

impl DaemonController {
    /// Creates a controller for the configured daemon.
    #[must_use]
    pub const fn new(section: DaemonSection) -> Self {
        Self {
            section,
            child: None,
        }
    }

    /// PID of the running daemon.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Command-line arguments for one start.
    #[must_use]
    pub fn command_args(&self, verbose: bool, dialect: Dialect) -> Vec<String> {
        let mut args = self.section.args.clone();
        args.push(format!("--cfgfile={}", self.section.config_file));
        if dialect != Dialect::Classic {
            args.push(format!("--config-type={dialect}"));
        }
        if verbose {
            args.push("-v".to_string());
        }
        args
    }

    fn ready_path(&self) -> Option<PathBuf> {
        self.section
            .ready_path
            .as_ref()
            .map(|p| self.section.working_dir.join(p))
    }

    async fn wait_ready(&mut self, pid: u32) -> Result<()> {
        let ready_path = self.ready_path();
        let start = Instant::now();
        loop {
            if let Some(child) = self.child.as_mut()
                && let Some(status) = child.try_wait()?
            {
                self.child = None;
                return Err(ControlError::Exited(status.to_string()));
            }

            let ready = match &ready_path {
                Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
                None => start.elapsed() >= STARTUP_GRACE,
            };
            if ready {
                tracing::info!(pid = pid, elapsed = ?start.elapsed(), "daemon ready");
                return Ok(());
            }
            if start.elapsed() >= self.section.start_timeout {
                tracing::error!(pid = pid, "daemon not ready before start timeout");
                if let Some(mut child) = self.child.take() {
                    let _ = child.kill().await;
                }
                return Err(ControlError::NotReady(self.section.start_timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    #[allow(clippy::cast_possible_wrap)] // PID from u32 fits in i32 range
    kill(Pid::from_raw(pid as i32), signal)
        .map_err(|e| ControlError::signal(format!("kill({pid}, {signal:?}) failed: {e}")))
}

#[async_trait]
impl ProcessController for DaemonController {
    async fn start(&mut self, config: &str, verbose: bool, dialect: Dialect) -> Result<()> {
        if let Some(pid) = self.pid() {
            return Err(ControlError::AlreadyRunning(pid));
        }

        let config_path = self.section.config_path();
        tokio::fs::write(&config_path, config).await?;
        if let Some(ready) = self.ready_path() {
            match tokio::fs::remove_file(&ready).await {
                Ok(()) => tracing::debug!(path = %ready.display(), "removed stale readiness marker"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let args = self.command_args(verbose, dialect);
        let output = || if verbose { Stdio::inherit() } else { Stdio::null() };
        let child = Command::new(&self.section.binary)
            .args(&args)
            .current_dir(&self.section.working_dir)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ControlError::spawn(format!("{}: {e}", self.section.binary.display()))
            })?;
        let pid = child
            .id()
            .ok_or_else(|| ControlError::spawn("process has no PID"))?;
        self.child = Some(child);

        tracing::info!(
            pid = pid,
            binary = %self.section.binary.display(),
            dialect = %dialect,
            config = %config_path.display(),
            "spawned daemon"
        );
        self.wait_ready(pid).await
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let Some(pid) = child.id() else {
            return Ok(());
        };

        if let Some(status) = child.try_wait()? {
            tracing::error!(pid = pid, status = %status, "daemon exited before stop");
            return Err(ControlError::ExitedEarly(status.to_string()));
        }

        tracing::info!(pid = pid, timeout = ?self.section.stop_timeout, "stopping daemon");
        #[cfg(unix)]
        if let Err(e) = send_signal(pid, Signal::SIGTERM) {
            tracing::warn!(pid = pid, error = %e, "failed to send SIGTERM, trying SIGKILL");
        }

        let start = Instant::now();
        while start.elapsed() < self.section.stop_timeout {
            if let Some(status) = child.try_wait()? {
                tracing::info!(pid = pid, status = %status, elapsed = ?start.elapsed(), "daemon stopped");
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        tracing::warn!(pid = pid, "graceful stop timed out, sending SIGKILL");
        child.start_kill()?;
        match tokio::time::timeout(Duration::from_secs(1), child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(pid = pid, status = %status, "daemon killed");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ControlError::shutdown(format!(
                "daemon PID {pid} failed to terminate after SIGKILL"
            ))),
        }
    }

    fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(dir: &std::path::Path, script: &str) -> DaemonSection {
        DaemonSection {
            binary: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into(), "sh".into()],
            working_dir: dir.to_path_buf(),
            config_file: "test.conf".into(),
            ready_path: None,
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_command_args() {
        let controller = DaemonController::new(DaemonSection::default());
        assert_eq!(
            controller.command_args(false, Dialect::Classic),
            ["-F", "--cfgfile=test.conf"]
        );
        assert_eq!(
            controller.command_args(true, Dialect::Lua),
            ["-F", "--cfgfile=test.conf", "--config-type=lua", "-v"]
        );
    }

    #[tokio::test]
    async fn test_start_writes_config_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = DaemonController::new(shell(dir.path(), "sleep 30"));

        controller
            .start("@version: 3.4\n", false, Dialect::Classic)
            .await
            .unwrap();
        assert!(controller.is_running());
        assert!(controller.pid().is_some());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("test.conf")).unwrap(),
            "@version: 3.4\n"
        );

        controller.stop().await.unwrap();
        assert!(!controller.is_running());
        // second stop is a no-op
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_ready_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syslog-ng.ctl"), b"stale").unwrap();
        let mut section = shell(dir.path(), "sleep 0.1; touch syslog-ng.ctl; sleep 30");
        section.ready_path = Some(PathBuf::from("syslog-ng.ctl"));

        let mut controller = DaemonController::new(section);
        let start = Instant::now();
        controller.start("", false, Dialect::Lua).await.unwrap();
        // the stale marker was removed, so start waited for the new one
        assert!(start.elapsed() >= Duration::from_millis(100));
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_ready_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = shell(dir.path(), "sleep 30");
        section.ready_path = Some(PathBuf::from("never"));
        section.start_timeout = Duration::from_millis(200);

        let mut controller = DaemonController::new(section);
        let err = controller.start("", false, Dialect::Classic).await.unwrap_err();
        assert!(matches!(err, ControlError::NotReady(_)));
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_exit_during_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = DaemonController::new(shell(dir.path(), "exit 3"));
        let err = controller.start("", false, Dialect::Classic).await.unwrap_err();
        assert!(matches!(err, ControlError::Exited(_)));
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = shell(dir.path(), "");
        section.binary = PathBuf::from("/nonexistent/logprobe/daemon");
        let mut controller = DaemonController::new(section);
        let err = controller.start("", false, Dialect::Classic).await.unwrap_err();
        assert!(matches!(err, ControlError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = DaemonController::new(shell(dir.path(), "sleep 30"));
        controller.start("", false, Dialect::Classic).await.unwrap();
        let err = controller.start("", false, Dialect::Classic).await.unwrap_err();
        assert!(matches!(err, ControlError::AlreadyRunning(_)));
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_sigterm_ignored_escalates_to_sigkill() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = shell(dir.path(), "trap '' TERM; sleep 30");
        section.stop_timeout = Duration::from_millis(200);
        let mut controller = DaemonController::new(section);
        controller.start("", false, Dialect::Classic).await.unwrap();

        let start = Instant::now();
        controller.stop().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_crash_before_stop_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = DaemonController::new(shell(dir.path(), "sleep 0.3; exit 1"));
        controller.start("", false, Dialect::Classic).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let err = controller.stop().await.unwrap_err();
        assert!(matches!(err, ControlError::ExitedEarly(_)));
        assert!(!controller.is_running());
    }
}
