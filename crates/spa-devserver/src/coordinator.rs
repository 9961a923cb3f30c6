//! Startup orchestration.

use crate::config::DevServerConfig;
use crate::endpoint::Endpoint;
use crate::error::{DevServerError, Result};
use crate::probe::{self, PortProbe, SystemPortProbe};
use crate::process::{Launcher, ProcessLauncher};
use crate::readiness::{Detection, Readiness, ReadinessDetector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How a race between readiness and the timeout ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    Ready,
    Failed(String),
    TimedOut,
}

/// Resolves the development server endpoint, starting the server if needed.
///
/// Each call to [`resolve`](Self::resolve) first checks whether the port is
/// already listening and returns immediately if so. Otherwise it launches the
/// tool, starts detection and waits for readiness up to the configured budget.
///
/// A child that times out is left running. The next call finds it through
/// the listening check once it finishes starting.
pub struct StartupCoordinator {
    config: DevServerConfig,
    endpoint: Endpoint,
    probe: Arc<dyn PortProbe>,
    launcher: Arc<dyn Launcher>,
    detector: ReadinessDetector,
}

impl StartupCoordinator {
    /// Create a coordinator using the system port probe and process launcher.
    pub fn new(config: DevServerConfig) -> Result<Self> {
        let launcher = Arc::new(ProcessLauncher::from_config(&config));
        Self::with_components(config, Arc::new(SystemPortProbe::new()), launcher)
    }

    /// Create a coordinator with explicit probe and launcher implementations.
    pub fn with_components(
        config: DevServerConfig,
        probe: Arc<dyn PortProbe>,
        launcher: Arc<dyn Launcher>,
    ) -> Result<Self> {
        config.validate()?;
        let endpoint = Endpoint::from_config(&config)?;
        let detector = ReadinessDetector::from_config(&config, probe.clone());

        Ok(Self {
            config,
            endpoint,
            probe,
            launcher,
            detector,
        })
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Check whether something is already listening on the configured port.
    pub async fn is_running(&self) -> bool {
        probe::check_listening(self.probe.clone(), self.config.port).await
    }

    /// Resolve the endpoint, launching the server and waiting for it if needed.
    pub async fn resolve(&self) -> Result<Endpoint> {
        if self.is_running().await {
            debug!("Port {} already listening, reusing server", self.config.port);
            return Ok(self.endpoint.clone());
        }

        let mode = self.config.mode;
        let mut handle =
            self.launcher
                .launch(mode, &self.config.working_dir, mode.redirects_output())?;

        let detection = self.detector.start(mode, &mut handle);
        let budget = self.config.ready_timeout;
        let started = Instant::now();

        let outcome = Self::race(&detection, budget).await;
        match outcome {
            StartupOutcome::Ready => {
                info!(
                    "Development server ready at {} after {:?}",
                    self.endpoint,
                    started.elapsed()
                );
                // Output readers keep relaying the child's output.
                detection.detach();
                Ok(self.endpoint.clone())
            }
            StartupOutcome::Failed(cause) => {
                detection.cancel();
                error!("Development server failed to start: {}", cause);
                Err(DevServerError::StreamFailed { cause })
            }
            StartupOutcome::TimedOut => {
                detection.cancel();
                warn!(
                    "Development server not ready within {:?}; leaving the process running (pid {:?})",
                    budget,
                    handle.pid()
                );
                Err(DevServerError::Timeout(budget))
            }
        }
    }

    /// Wait for the detection to settle or `budget` to elapse.
    ///
    /// If readiness and the deadline land in the same wakeup, the signal is
    /// checked first and wins. Either outcome is acceptable at that boundary.
    pub async fn race(detection: &Detection, budget: Duration) -> StartupOutcome {
        match tokio::time::timeout(budget, detection.signal().wait()).await {
            Ok(Readiness::Ready) => StartupOutcome::Ready,
            Ok(Readiness::Failed(cause)) => StartupOutcome::Failed(cause),
            Ok(Readiness::Pending) | Err(_) => StartupOutcome::TimedOut,
        }
    }
}
