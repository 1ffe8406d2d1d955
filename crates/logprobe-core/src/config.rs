//! Harness configuration.
//!
//! Configuration is validated at load time (Poka-Yoke), with sensible
//! defaults and clear error messages. Durations are written as human readable
//! strings (`"500ms"`, `"10s"`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Forward verbose output to the daemon and the reporter.
    pub verbose: bool,
    /// How the daemon under test is launched.
    pub daemon: DaemonSection,
    /// Verification timing.
    pub verify: VerifySection,
    /// Port numbers substituted into configuration bodies.
    pub ports: PortsSection,
    /// Filesystem locations substituted into configuration bodies.
    pub paths: PathsSection,
}

impl HarnessConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CoreError::config(format!("failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CoreError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.daemon.validate()?;
        self.verify.validate()?;
        self.ports.validate()?;
        Ok(())
    }

    /// Values available to `@name@` placeholders in configuration bodies.
    #[must_use]
    pub fn template_context(&self) -> BTreeMap<String, String> {
        let mut ctx = BTreeMap::new();
        ctx.insert("port_number".to_string(), self.ports.port_number.to_string());
        ctx.insert(
            "ssl_port_number".to_string(),
            self.ports.ssl_port_number.to_string(),
        );
        ctx.insert(
            "port_number_syslog".to_string(),
            self.ports.port_number_syslog.to_string(),
        );
        ctx.insert(
            "port_number_network".to_string(),
            self.ports.port_number_network.to_string(),
        );
        ctx.insert("feed_port".to_string(), self.ports.feed_port.to_string());
        ctx.insert(
            "src_dir".to_string(),
            self.paths.src_dir.display().to_string(),
        );
        ctx.insert(
            "work_dir".to_string(),
            self.daemon.working_dir.display().to_string(),
        );
        ctx
    }
}

/// Replaces `@name@` placeholders in a configuration body.
///
/// A lone `@` that does not open a well-formed placeholder (for instance the
/// `@version:` pragma) is copied verbatim.
///
/// # Errors
/// Returns an error if a placeholder names an unknown key.
pub fn render_template(body: &str, ctx: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find('@') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with('@') {
            let name = &after[..name_len];
            let value = ctx
                .get(name)
                .ok_or_else(|| CoreError::template(format!("unknown placeholder @{name}@")))?;
            out.push_str(value);
            rest = &after[name_len + 1..];
        } else {
            out.push('@');
            rest = after;
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Daemon launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    /// Path to the daemon binary.
    pub binary: PathBuf,
    /// Extra command-line arguments.
    pub args: Vec<String>,
    /// Directory the daemon runs in; artifacts are read relative to it.
    pub working_dir: PathBuf,
    /// File name the rendered configuration body is written to.
    pub config_file: String,
    /// File whose appearance signals the daemon is ready (pid or control socket).
    pub ready_path: Option<PathBuf>,
    /// Maximum time to wait for readiness after spawning.
    #[serde(with = "humantime_str")]
    pub start_timeout: Duration,
    /// Grace period between SIGTERM and SIGKILL.
    #[serde(with = "humantime_str")]
    pub stop_timeout: Duration,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("syslog-ng"),
            args: vec!["-F".to_string()],
            working_dir: PathBuf::from("."),
            config_file: "test.conf".to_string(),
            ready_path: None,
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl DaemonSection {
    fn validate(&self) -> Result<()> {
        if self.binary.as_os_str().is_empty() {
            return Err(CoreError::config("daemon.binary cannot be empty"));
        }
        if self.config_file.is_empty() || self.config_file.contains('/') {
            return Err(CoreError::config(
                "daemon.config_file must be a plain file name",
            ));
        }
        if self.start_timeout.is_zero() {
            return Err(CoreError::config("daemon.start_timeout must be positive"));
        }
        Ok(())
    }

    /// Full path of the written configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.working_dir.join(&self.config_file)
    }
}

/// Verification timing: a minimum settle delay, then polling with
/// exponential backoff until the artifact matches or the timeout elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySection {
    /// Minimum wait before the first read.
    #[serde(with = "humantime_str")]
    pub settle_delay: Duration,
    /// Delay before the first re-read.
    #[serde(with = "humantime_str")]
    pub initial_backoff: Duration,
    /// Upper bound on a single re-read delay.
    #[serde(with = "humantime_str")]
    pub max_backoff: Duration,
    /// Multiplier applied to the delay after each re-read.
    pub multiplier: f64,
    /// Total time budget for verification including the settle delay.
    #[serde(with = "humantime_str")]
    pub timeout: Duration,
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
            timeout: Duration::from_secs(10),
        }
    }
}

impl VerifySection {
    fn validate(&self) -> Result<()> {
        if self.multiplier < 1.0 {
            return Err(CoreError::config("verify.multiplier must be at least 1.0"));
        }
        if self.timeout < self.settle_delay {
            return Err(CoreError::config(
                "verify.timeout must not be shorter than verify.settle_delay",
            ));
        }
        if self.initial_backoff.is_zero() {
            return Err(CoreError::config("verify.initial_backoff must be positive"));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(CoreError::config(
                "verify.max_backoff must not be shorter than verify.initial_backoff",
            ));
        }
        Ok(())
    }
}

/// Port numbers used by the shipped configuration bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsSection {
    /// Plain TCP/UDP source port.
    pub port_number: u16,
    /// TLS source port.
    pub ssl_port_number: u16,
    /// RFC 5424 syslog source port.
    pub port_number_syslog: u16,
    /// Network driver source port.
    pub port_number_network: u16,
    /// Port the feed destination listens on.
    pub feed_port: u16,
}

impl Default for PortsSection {
    fn default() -> Self {
        Self {
            port_number: 2000,
            ssl_port_number: 2001,
            port_number_syslog: 2002,
            port_number_network: 2003,
            feed_port: 8081,
        }
    }
}

impl PortsSection {
    fn validate(&self) -> Result<()> {
        let ports = [
            self.port_number,
            self.ssl_port_number,
            self.port_number_syslog,
            self.port_number_network,
            self.feed_port,
        ];
        if ports.contains(&0) {
            return Err(CoreError::config("ports must be non-zero"));
        }
        for (i, port) in ports.iter().enumerate() {
            if ports[i + 1..].contains(port) {
                return Err(CoreError::config(format!("port {port} is assigned twice")));
            }
        }
        Ok(())
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Directory holding TLS material (`ssl.crt`, `ssl.key`).
    pub src_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("."),
        }
    }
}

mod humantime_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
