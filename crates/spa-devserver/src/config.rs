//! Configuration for launching and waiting on the development server.
//!
//! Every tunable that would otherwise be a global constant (port, timeout,
//! readiness marker, poll interval) lives on [`DevServerConfig`], which is
//! handed to the coordinator once at construction.

use crate::error::{DevServerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default values used when a field is not configured.
pub struct Defaults;

impl Defaults {
    pub const SCHEME: &'static str = "http";
    pub const HOST: &'static str = "127.0.0.1";
    pub const PORT: u16 = 8080;
    pub const WORKING_DIR: &'static str = "ClientApp";
    pub const TOOL: &'static str = "npm";
    pub const SCRIPT_ARGS: [&'static str; 2] = ["run", "serve"];
    pub const READY_TIMEOUT: Duration = Duration::from_secs(60);
    pub const READY_MARKER: &'static str = "running at";
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
}

/// How the development server is started and how readiness is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// Redirect the tool's output and parse it for the readiness marker.
    ///
    /// The child's console belongs to this process, which can interfere with
    /// hot reload when a debugging session is stopped and restarted.
    Parse,

    /// Run the tool in the background and poll the listening port.
    #[default]
    Poll,

    /// Like [`ServeMode::Poll`], but the tool gets its own minimized window.
    ///
    /// Only Windows can open the separate window. Elsewhere this behaves
    /// exactly like `Poll`; start the tool by hand beforehand to get an
    /// isolated console.
    Isolated,
}

impl ServeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServeMode::Parse => "parse",
            ServeMode::Poll => "poll",
            ServeMode::Isolated => "isolated",
        }
    }

    /// Whether the child's standard streams are piped back to us.
    pub fn redirects_output(&self) -> bool {
        matches!(self, ServeMode::Parse)
    }
}

impl fmt::Display for ServeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServeMode {
    type Err = DevServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parse" => Ok(ServeMode::Parse),
            "poll" => Ok(ServeMode::Poll),
            "isolated" => Ok(ServeMode::Isolated),
            other => Err(DevServerError::config(
                "mode",
                format!("unknown serve mode '{}', expected parse, poll or isolated", other),
            )),
        }
    }
}

/// Configuration for a [`StartupCoordinator`](crate::StartupCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// URL scheme of the resolved endpoint.
    pub scheme: String,
    /// Host of the resolved endpoint.
    pub host: String,
    /// Port the development server listens on.
    pub port: u16,
    /// Detection strategy.
    pub mode: ServeMode,
    /// Directory the tool is started in.
    pub working_dir: PathBuf,
    /// Tool executable (e.g. `npm`).
    pub tool: String,
    /// Arguments passed to the tool.
    pub script_args: Vec<String>,
    /// How long to wait for readiness.
    #[serde(rename = "ready_timeout_ms", with = "duration_ms")]
    pub ready_timeout: Duration,
    /// Substring of a stdout line that marks the server as ready.
    pub ready_marker: String,
    /// Delay between listening-port checks.
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            scheme: Defaults::SCHEME.to_string(),
            host: Defaults::HOST.to_string(),
            port: Defaults::PORT,
            mode: ServeMode::default(),
            working_dir: PathBuf::from(Defaults::WORKING_DIR),
            tool: Defaults::TOOL.to_string(),
            script_args: Defaults::SCRIPT_ARGS.iter().map(|s| s.to_string()).collect(),
            ready_timeout: Defaults::READY_TIMEOUT,
            ready_marker: Defaults::READY_MARKER.to_string(),
            poll_interval: Defaults::POLL_INTERVAL,
        }
    }
}

impl DevServerConfig {
    /// Create a config with the defaults (`npm run serve` in `ClientApp`, port 8080).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_mode(mut self, mode: ServeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_script_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.ready_marker = marker.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reject values that would make startup hang or never match.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(DevServerError::config("port", "must be a fixed, non-zero port"));
        }
        if self.host.trim().is_empty() {
            return Err(DevServerError::config("host", "must not be empty"));
        }
        if self.tool.trim().is_empty() {
            return Err(DevServerError::config("tool", "must not be empty"));
        }
        if self.ready_marker.is_empty() {
            return Err(DevServerError::config("ready_marker", "must not be empty"));
        }
        if self.ready_timeout.is_zero() {
            return Err(DevServerError::config("ready_timeout", "must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(DevServerError::config("poll_interval", "must be greater than zero"));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
