//! Platform abstraction for starting the development server tool.
//!
//! Windows starts the tool through `cmd`, which can also open it in its own
//! minimized window. Every other platform runs the tool directly and has no
//! detached-window support. Each family is one [`InvocationStrategy`]
//! implementation; [`host_strategy`] picks the one for the running platform.

mod direct;
mod windows;

pub use direct::DirectExec;
pub use windows::WindowsShell;

use crate::config::ServeMode;
use std::sync::Arc;

/// Program and arguments used to start the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Whether the child gets its own window instead of our console.
    pub detached_window: bool,
}

impl Invocation {
    /// Render as a single command line for log messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Platform capability for building the tool invocation.
pub trait InvocationStrategy: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Whether `ServeMode::Isolated` can open a separate window.
    fn supports_detached_window(&self) -> bool;

    /// Build the invocation of `tool script_args..` for the given mode.
    fn build_invocation(&self, mode: ServeMode, tool: &str, script_args: &[String]) -> Invocation;
}

/// Strategy for the platform this binary was compiled for.
pub fn host_strategy() -> Arc<dyn InvocationStrategy> {
    if cfg!(windows) {
        Arc::new(WindowsShell)
    } else {
        Arc::new(DirectExec)
    }
}

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform() {
        let platform = current_platform();
        assert!(["linux", "windows", "macos", "unknown"].contains(&platform));
    }

    #[test]
    fn test_host_strategy_matches_platform() {
        let strategy = host_strategy();
        assert_eq!(strategy.supports_detached_window(), cfg!(windows));
    }

    #[test]
    fn test_command_line() {
        let invocation = Invocation {
            program: "npm".into(),
            args: vec!["run".into(), "serve".into()],
            detached_window: false,
        };
        assert_eq!(invocation.command_line(), "npm run serve");
    }
}
