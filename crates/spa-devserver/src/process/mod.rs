//! Process launching for the development server.
//!
//! The launcher builds a platform-specific invocation of the tool, decides
//! whether the child's standard streams are piped back (only when its output
//! will be parsed) and wraps the result in a [`ProcessHandle`].
//!
//! The child is never killed by this crate. Whoever embeds the launcher owns
//! the decision of when, if ever, to stop it.

mod handle;
mod launcher;

pub use handle::{InputStream, OutputStream, ProcessHandle};
pub use launcher::{Launcher, ProcessLauncher};
