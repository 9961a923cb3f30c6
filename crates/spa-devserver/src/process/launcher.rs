//! Starting the development server tool.

use super::handle::ProcessHandle;
use crate::config::{DevServerConfig, ServeMode};
use crate::error::{DevServerError, Result};
use crate::platform::{self, InvocationStrategy};
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Something that can start the development server.
pub trait Launcher: Send + Sync {
    /// Start the tool in `working_dir`.
    ///
    /// stdin, stdout and stderr are piped if and only if `redirect_output` is
    /// true; otherwise the child shares this process's console.
    fn launch(
        &self,
        mode: ServeMode,
        working_dir: &Path,
        redirect_output: bool,
    ) -> Result<ProcessHandle>;
}

/// Launches the configured tool with the platform's invocation strategy.
pub struct ProcessLauncher {
    strategy: Arc<dyn InvocationStrategy>,
    tool: String,
    script_args: Vec<String>,
}

impl ProcessLauncher {
    /// Create a launcher for `tool script_args..` using the host strategy.
    pub fn new(tool: impl Into<String>, script_args: Vec<String>) -> Self {
        Self::with_strategy(platform::host_strategy(), tool, script_args)
    }

    /// Create a launcher with an explicit invocation strategy.
    pub fn with_strategy(
        strategy: Arc<dyn InvocationStrategy>,
        tool: impl Into<String>,
        script_args: Vec<String>,
    ) -> Self {
        Self {
            strategy,
            tool: tool.into(),
            script_args,
        }
    }

    /// Create a launcher for the tool named in `config`.
    pub fn from_config(config: &DevServerConfig) -> Self {
        Self::new(config.tool.clone(), config.script_args.clone())
    }

    pub fn strategy(&self) -> &dyn InvocationStrategy {
        self.strategy.as_ref()
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &self,
        mode: ServeMode,
        working_dir: &Path,
        redirect_output: bool,
    ) -> Result<ProcessHandle> {
        let invocation = self
            .strategy
            .build_invocation(mode, &self.tool, &self.script_args);

        if mode == ServeMode::Isolated && !self.strategy.supports_detached_window() {
            warn!(
                "Isolated mode is not supported on {}; `{}` runs in the background like poll mode. \
                 Start it manually beforehand if you need a separate console.",
                platform::current_platform(),
                invocation.command_line()
            );
        }

        if !working_dir.is_dir() {
            return Err(DevServerError::launch(
                invocation.program,
                working_dir,
                io::Error::new(io::ErrorKind::NotFound, "working directory does not exist"),
            ));
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.current_dir(working_dir);
        // The server must keep running after the handle is dropped.
        cmd.kill_on_drop(false);

        if redirect_output {
            cmd.stdin(Stdio::piped());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdin(Stdio::inherit());
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        info!(
            "Launching `{}` in {} ({} mode, {})",
            invocation.command_line(),
            working_dir.display(),
            mode,
            self.strategy.name()
        );

        let child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn `{}`: {}", invocation.command_line(), e);
            DevServerError::launch(invocation.program.clone(), working_dir, e)
        })?;

        let handle = ProcessHandle::from_child(child);
        info!("Launched development server with PID {:?}", handle.pid());

        Ok(handle)
    }
}
