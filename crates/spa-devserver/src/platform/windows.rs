//! `cmd`-wrapped invocation used on Windows.

use super::{Invocation, InvocationStrategy};
use crate::config::ServeMode;

/// Starts the tool through `cmd /c`, so `.cmd` shims such as `npm.cmd` resolve.
///
/// `ServeMode::Isolated` becomes `cmd /c start /MIN <tool> ...`, which opens the
/// tool in a new minimized window that is not attached to our streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsShell;

impl InvocationStrategy for WindowsShell {
    fn name(&self) -> &'static str {
        "windows-shell"
    }

    fn supports_detached_window(&self) -> bool {
        true
    }

    fn build_invocation(&self, mode: ServeMode, tool: &str, script_args: &[String]) -> Invocation {
        let mut args = vec!["/c".to_string()];
        let detached_window = mode == ServeMode::Isolated;
        if detached_window {
            args.extend(["start".to_string(), "/MIN".to_string()]);
        }
        args.push(tool.to_string());
        args.extend(script_args.iter().cloned());

        Invocation {
            program: "cmd".to_string(),
            args,
            detached_window,
        }
    }
}
