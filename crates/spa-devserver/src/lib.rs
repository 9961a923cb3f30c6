//! SPA Devserver - start a front-end development server and resolve its endpoint.
//!
//! Build tools such as `npm run serve` take an unpredictable amount of time to
//! bind their port. This crate launches the tool, decides when it is ready and
//! hands back the address a reverse proxy should forward to, or fails after a
//! bounded wait.
//!
//! Readiness is detected in one of two ways, chosen by [`ServeMode`]:
//! - **parse** - read the tool's output and wait for a marker line
//!   (`"running at"` by default)
//! - **poll** / **isolated** - poll the OS listener table for the port
//!
//! If the port is already listening, no process is started at all, so the
//! same server is reused across restarts of the host application.
//!
//! # Example
//!
//! ```rust,no_run
//! use spa_devserver::{DevServerConfig, ServeMode, StartupCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> spa_devserver::Result<()> {
//!     let config = DevServerConfig::new()
//!         .with_mode(ServeMode::Parse)
//!         .with_working_dir("ClientApp");
//!     let coordinator = StartupCoordinator::new(config)?;
//!
//!     let endpoint = coordinator.resolve().await?;
//!     println!("Proxy to {}", endpoint);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Process lifetime
//!
//! The launched process is never stopped by this crate, including after a
//! timeout. The embedding application decides whether to stop it on shutdown.

pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod platform;
pub mod probe;
pub mod process;
pub mod proxy;
pub mod readiness;

// Re-export commonly used types
pub use config::{DevServerConfig, ServeMode};
pub use coordinator::{StartupCoordinator, StartupOutcome};
pub use endpoint::Endpoint;
pub use error::{DevServerError, FailureKind, Result};
pub use platform::{DirectExec, Invocation, InvocationStrategy, WindowsShell};
pub use probe::{PortProbe, SystemPortProbe};
pub use process::{InputStream, Launcher, OutputStream, ProcessHandle, ProcessLauncher};
pub use proxy::ProxyTargetSource;
pub use readiness::{Detection, Readiness, ReadinessDetector, ReadinessSignal};
