//! Readiness detection strategies.
//!
//! # Output parsing
//!
//! Two tasks read the child's stdout and stderr line by line. Stdout lines are
//! logged at info, stderr lines at error. The first stdout line containing the
//! marker marks the server ready. If either stream ends or fails to read before
//! that, the attempt fails. After readiness both readers keep relaying output
//! until the streams close, so the child never blocks on a full pipe.
//!
//! Lines are split on raw bytes and decoded lossily; a line in a legacy
//! codepage is logged with replacement characters and never ends a reader.
//! The stdout reader also owns the child's stdin pipe and keeps it open
//! until it stops.
//!
//! # Port polling
//!
//! One task checks the listening port every poll interval and marks the server
//! ready once it is bound. Polling never fails by itself; only the caller's
//! timeout ends a poll that does not converge.

use super::signal::ReadinessSignal;
use crate::config::{DevServerConfig, ServeMode};
use crate::error::STREAM_FAILURE_CAUSE;
use crate::probe::{self, PortProbe};
use crate::process::{InputStream, OutputStream, ProcessHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Tracing target for relayed child output.
pub const OUTPUT_TARGET: &str = "spa_devserver::output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    Stdout,
    Stderr,
}

impl OutputKind {
    fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Stdout => "stdout",
            OutputKind::Stderr => "stderr",
        }
    }
}

/// Starts the detection strategy for a launched server.
#[derive(Clone)]
pub struct ReadinessDetector {
    marker: String,
    port: u16,
    poll_interval: Duration,
    probe: Arc<dyn PortProbe>,
}

impl ReadinessDetector {
    pub fn new(
        marker: impl Into<String>,
        port: u16,
        poll_interval: Duration,
        probe: Arc<dyn PortProbe>,
    ) -> Self {
        Self {
            marker: marker.into(),
            port,
            poll_interval,
            probe,
        }
    }

    pub fn from_config(config: &DevServerConfig, probe: Arc<dyn PortProbe>) -> Self {
        Self::new(
            config.ready_marker.clone(),
            config.port,
            config.poll_interval,
            probe,
        )
    }

    /// Start the strategy that matches `mode`.
    ///
    /// `ServeMode::Parse` takes the handle's output streams; if they were not
    /// redirected the returned detection has already failed.
    pub fn start(&self, mode: ServeMode, handle: &mut ProcessHandle) -> Detection {
        if !mode.redirects_output() {
            return self.poll_port();
        }

        match handle.take_output() {
            Some((stdout, stderr)) => self.watch_output(stdout, stderr, handle.take_input()),
            None => {
                let detection = Detection::new();
                error!("Output parsing requested but the process output was not redirected");
                detection
                    .signal
                    .mark_failed(format!("{}: output was not redirected", STREAM_FAILURE_CAUSE));
                detection
            }
        }
    }

    /// Parse the child's output for the readiness marker.
    ///
    /// `stdin`, if given, stays open until the stdout reader stops.
    pub fn watch_output(
        &self,
        stdout: OutputStream,
        stderr: OutputStream,
        stdin: Option<InputStream>,
    ) -> Detection {
        let mut detection = Detection::new();

        detection.tasks.push(tokio::spawn(relay_lines(
            OutputKind::Stdout,
            stdout,
            stdin,
            Some(self.marker.clone()),
            detection.signal.clone(),
            detection.cancel.clone(),
        )));
        detection.tasks.push(tokio::spawn(relay_lines(
            OutputKind::Stderr,
            stderr,
            None,
            None,
            detection.signal.clone(),
            detection.cancel.clone(),
        )));

        detection
    }

    /// Poll the listening port until it is bound.
    pub fn poll_port(&self) -> Detection {
        let mut detection = Detection::new();

        detection.tasks.push(tokio::spawn(poll_until_listening(
            self.probe.clone(),
            self.port,
            self.poll_interval,
            detection.signal.clone(),
            detection.cancel.clone(),
        )));

        detection
    }
}

/// Running detection tasks for one startup attempt.
pub struct Detection {
    signal: ReadinessSignal,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Detection {
    fn new() -> Self {
        Self {
            signal: ReadinessSignal::new(),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn signal(&self) -> &ReadinessSignal {
        &self.signal
    }

    /// Number of background tasks started for this attempt.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Ask every task to stop at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for every task to finish.
    pub async fn join(self) {
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                debug!("Readiness task ended abnormally: {}", e);
            }
        }
    }

    /// Let the tasks run on without tracking them.
    pub fn detach(self) {
        drop(self.tasks);
    }
}

async fn relay_lines(
    kind: OutputKind,
    stream: OutputStream,
    stdin: Option<InputStream>,
    marker: Option<String>,
    signal: ReadinessSignal,
    cancel: CancellationToken,
) {
    // Dropped when this reader returns.
    let _stdin = stdin;
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("{} reader cancelled", kind.as_str());
                return;
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                stream_ended(kind, &signal, "closed");
                return;
            }
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&buf);
                let line = decoded.trim_end_matches(|c: char| c == '\n' || c == '\r');

                match kind {
                    OutputKind::Stdout => info!(target: OUTPUT_TARGET, stream = "stdout", "{}", line),
                    OutputKind::Stderr => error!(target: OUTPUT_TARGET, stream = "stderr", "{}", line),
                }

                if let Some(marker) = marker.as_deref() {
                    if !signal.is_completed() && line.contains(marker) && signal.mark_ready() {
                        debug!("Readiness marker '{}' seen on {}", marker, kind.as_str());
                    }
                }
            }
            Err(e) => {
                error!("Error reading development server {}: {}", kind.as_str(), e);
                stream_ended(kind, &signal, &e.to_string());
                return;
            }
        }
    }
}

fn stream_ended(kind: OutputKind, signal: &ReadinessSignal, reason: &str) {
    if signal.is_completed() {
        debug!("Development server {} {}", kind.as_str(), reason);
        return;
    }

    let cause = format!("{} ({} {})", STREAM_FAILURE_CAUSE, kind.as_str(), reason);
    if signal.mark_failed(cause.clone()) {
        error!("{}", cause);
    }
}

async fn poll_until_listening(
    probe: Arc<dyn PortProbe>,
    port: u16,
    interval: Duration,
    signal: ReadinessSignal,
    cancel: CancellationToken,
) {
    debug!("Polling port {} every {:?}", port, interval);

    loop {
        if cancel.is_cancelled() {
            debug!("Port poll for {} cancelled", port);
            return;
        }

        if probe::check_listening(probe.clone(), port).await {
            if signal.mark_ready() {
                debug!("Port {} is listening", port);
            }
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Port poll for {} cancelled", port);
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
