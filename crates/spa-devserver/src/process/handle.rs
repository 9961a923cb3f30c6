//! Handle to a launched development server.

use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;

/// A boxed output stream read line by line by the readiness detector.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// The write end of the child's stdin.
pub type InputStream = Box<dyn AsyncWrite + Send + Unpin>;

/// The launched child and, when output was redirected, its standard streams.
///
/// Dropping the handle does not stop the process: the child is expected to
/// outlive the startup call so later calls find it already listening. A piped
/// stdin still held here is closed on drop, so take it first with
/// [`take_input`](Self::take_input) to keep it open.
pub struct ProcessHandle {
    pid: Option<u32>,
    child: Option<Child>,
    stdin: Option<InputStream>,
    stdout: Option<OutputStream>,
    stderr: Option<OutputStream>,
}

impl ProcessHandle {
    /// Wrap a spawned child, taking ownership of any piped output streams.
    pub fn from_child(mut child: Child) -> Self {
        let stdin = child.stdin.take().map(|s| Box::new(s) as InputStream);
        let stdout = child
            .stdout
            .take()
            .map(|s| Box::new(s) as OutputStream);
        let stderr = child
            .stderr
            .take()
            .map(|s| Box::new(s) as OutputStream);

        Self {
            pid: child.id(),
            child: Some(child),
            stdin,
            stdout,
            stderr,
        }
    }

    /// Handle over in-memory output streams with no OS process behind it.
    ///
    /// Used to drive the output parser from something other than a real child,
    /// such as a pipe fed by a test.
    pub fn from_streams<O, E>(stdout: O, stderr: E) -> Self
    where
        O: AsyncRead + Send + Unpin + 'static,
        E: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            pid: None,
            child: None,
            stdin: None,
            stdout: Some(Box::new(stdout)),
            stderr: Some(Box::new(stderr)),
        }
    }

    /// Handle with neither a process nor streams.
    pub fn detached() -> Self {
        Self {
            pid: None,
            child: None,
            stdin: None,
            stdout: None,
            stderr: None,
        }
    }

    /// OS process id, if there is a live child.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Attach the write end of a stdin pipe.
    pub fn with_input<I>(mut self, stdin: I) -> Self
    where
        I: AsyncWrite + Send + Unpin + 'static,
    {
        self.stdin = Some(Box::new(stdin));
        self
    }

    /// Take the stdout/stderr pair. Returns None if either was not redirected.
    pub fn take_output(&mut self) -> Option<(OutputStream, OutputStream)> {
        match (self.stdout.take(), self.stderr.take()) {
            (Some(out), Some(err)) => Some((out, err)),
            (out, err) => {
                self.stdout = out;
                self.stderr = err;
                None
            }
        }
    }

    /// Take the stdin pipe, if it was redirected.
    pub fn take_input(&mut self) -> Option<InputStream> {
        self.stdin.take()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("has_child", &self.child.is_some())
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}
