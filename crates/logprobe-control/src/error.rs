//! Process controller error types.

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors starting or stopping the daemon under test.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The daemon process could not be spawned.
    #[error("failed to spawn daemon: {0}")]
    Spawn(String),

    /// The daemon exited while starting.
    #[error("daemon exited during startup: {0}")]
    Exited(String),

    /// The daemon died while a test function was running.
    #[error("daemon exited before it was stopped: {0}")]
    ExitedEarly(String),

    /// The readiness marker did not appear in time.
    #[error("daemon not ready after {0:?}")]
    NotReady(std::time::Duration),

    /// A signal could not be delivered.
    #[error("failed to send signal: {0}")]
    Signal(String),

    /// The daemon survived SIGKILL.
    #[error("failed to stop daemon: {0}")]
    Shutdown(String),

    /// Start was requested while a daemon is running.
    #[error("daemon already running (pid {0})")]
    AlreadyRunning(u32),

    /// The controller was scripted to fail.
    #[error("scripted failure: {0}")]
    Scripted(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ControlError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Creates a signal error.
    #[must_use]
    pub fn signal(msg: impl Into<String>) -> Self {
        Self::Signal(msg.into())
    }

    /// Creates a shutdown error.
    #[must_use]
    pub fn shutdown(msg: impl Into<String>) -> Self {
        Self::Shutdown(msg.into())
    }

    /// Creates a scripted failure.
    #[must_use]
    pub fn scripted(msg: impl Into<String>) -> Self {
        Self::Scripted(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_spawn_error() {
        let err = ControlError::spawn("syslog-ng: not found");
        assert_eq!(err.to_string(), "failed to spawn daemon: syslog-ng: not found");
    }

    #[test]
    fn test_not_ready_error() {
        let err = ControlError::NotReady(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }

    #[test]
    fn test_exit_messages_tell_startup_from_mid_run() {
        let startup = ControlError::Exited("exit status: 1".into());
        let mid_run = ControlError::ExitedEarly("exit status: 1".into());
        assert!(startup.to_string().contains("during startup"));
        assert!(!mid_run.to_string().contains("startup"));
        assert!(mid_run.to_string().contains("before it was stopped"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ControlError = io.into();
        assert!(matches!(err, ControlError::Io(_)));
    }
}
