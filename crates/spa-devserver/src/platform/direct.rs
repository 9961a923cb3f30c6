//! Direct invocation used on Linux, macOS and other Unix-likes.

use super::{Invocation, InvocationStrategy};
use crate::config::ServeMode;

/// Runs the tool directly without a shell.
///
/// There is no way to open a separate window here, so `ServeMode::Isolated`
/// produces the same invocation as `ServeMode::Poll`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExec;

impl InvocationStrategy for DirectExec {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn supports_detached_window(&self) -> bool {
        false
    }

    fn build_invocation(&self, _mode: ServeMode, tool: &str, script_args: &[String]) -> Invocation {
        Invocation {
            program: tool.to_string(),
            args: script_args.to_vec(),
            detached_window: false,
        }
    }
}
