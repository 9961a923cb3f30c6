//! Integration tests for resolving the development server endpoint.
//!
//! Scripted probes and launchers stand in for the OS where timing matters;
//! the remaining tests start real processes and bind real sockets.

use spa_devserver::{
    DevServerConfig, FailureKind, Launcher, PortProbe, ProcessHandle, ProcessLauncher,
    ProxyTargetSource, ServeMode, StartupCoordinator, SystemPortProbe,
};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Probe whose answer is flipped by the test.
#[derive(Default)]
struct ScriptedProbe {
    listening: AtomicBool,
}

impl PortProbe for ScriptedProbe {
    fn is_listening(&self, _port: u16) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Launcher that hands out a prepared handle and counts calls.
#[derive(Default)]
struct ScriptedLauncher {
    calls: AtomicUsize,
    handle: Mutex<Option<ProcessHandle>>,
    on_launch: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ScriptedLauncher {
    fn with_handle(handle: ProcessHandle) -> Self {
        Self {
            handle: Mutex::new(Some(handle)),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Launcher for ScriptedLauncher {
    fn launch(
        &self,
        _mode: ServeMode,
        _working_dir: &Path,
        _redirect_output: bool,
    ) -> spa_devserver::Result<ProcessHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.on_launch.lock().unwrap().take() {
            hook();
        }
        Ok(self
            .handle
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(ProcessHandle::detached))
    }
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().unwrap().port()
}

fn fast_config(mode: ServeMode) -> DevServerConfig {
    DevServerConfig::new()
        .with_mode(mode)
        .with_ready_timeout(Duration::from_millis(200))
}

#[tokio::test]
async fn test_parse_scenario_resolves_after_marker() {
    let (stdout, mut out_tx) = tokio::io::duplex(1024);
    let (stderr, _err_tx) = tokio::io::duplex(1024);
    let launcher = Arc::new(ScriptedLauncher::with_handle(ProcessHandle::from_streams(
        stdout, stderr,
    )));
    let coordinator = StartupCoordinator::with_components(
        fast_config(ServeMode::Parse),
        Arc::new(ScriptedProbe::default()),
        launcher.clone(),
    )
    .unwrap();

    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        out_tx
            .write_all(b"Server running at http://localhost:8080\n")
            .await
            .unwrap();
        // Keep stdout open like a live server would.
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let started = Instant::now();
    let endpoint = coordinator.resolve().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(endpoint.to_string(), "http://127.0.0.1:8080");
    assert!(elapsed >= Duration::from_millis(45), "resolved too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(200), "resolved too late: {:?}", elapsed);
    assert_eq!(launcher.calls(), 1);
    writer.abort();
}

#[tokio::test]
async fn test_parse_keeps_stdin_open_after_resolve() {
    let (stdout, mut out_tx) = tokio::io::duplex(1024);
    let (stderr, _err_tx) = tokio::io::duplex(1024);
    let (stdin, mut stdin_rx) = tokio::io::duplex(64);
    let launcher = Arc::new(ScriptedLauncher::with_handle(
        ProcessHandle::from_streams(stdout, stderr).with_input(stdin),
    ));
    let coordinator = StartupCoordinator::with_components(
        fast_config(ServeMode::Parse),
        Arc::new(ScriptedProbe::default()),
        launcher,
    )
    .unwrap();

    out_tx.write_all(b"App running at http://localhost:8080/\n").await.unwrap();
    coordinator.resolve().await.unwrap();

    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_millis(100), stdin_rx.read(&mut buf)).await;
    assert!(read.is_err(), "child stdin closed after resolve: {:?}", read);
}

#[tokio::test]
async fn test_poll_scenario_times_out_at_budget() {
    let launcher = Arc::new(ScriptedLauncher::default());
    let coordinator = StartupCoordinator::with_components(
        fast_config(ServeMode::Poll),
        Arc::new(ScriptedProbe::default()),
        launcher.clone(),
    )
    .unwrap();

    let started = Instant::now();
    let err = coordinator.resolve().await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(elapsed >= Duration::from_millis(200), "timed out early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "timed out late: {:?}", elapsed);
}

#[tokio::test]
async fn test_parse_stream_closing_is_not_a_timeout() {
    let (stdout, mut out_tx) = tokio::io::duplex(1024);
    let (stderr, mut err_tx) = tokio::io::duplex(1024);
    let launcher = Arc::new(ScriptedLauncher::with_handle(ProcessHandle::from_streams(
        stdout, stderr,
    )));
    let coordinator = StartupCoordinator::with_components(
        fast_config(ServeMode::Parse).with_ready_timeout(Duration::from_secs(5)),
        Arc::new(ScriptedProbe::default()),
        launcher,
    )
    .unwrap();

    tokio::spawn(async move {
        out_tx.write_all(b"> vue-cli-service serve\n").await.unwrap();
        err_tx.write_all(b"sh: vue-cli-service: not found\n").await.unwrap();
    });

    let started = Instant::now();
    let err = coordinator.resolve().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Stream);
    assert!(err.to_string().contains("failed to start"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timeout_then_fast_path_reuses_server() {
    let probe = Arc::new(ScriptedProbe::default());
    let launcher = Arc::new(ScriptedLauncher::default());
    let coordinator = StartupCoordinator::with_components(
        fast_config(ServeMode::Isolated),
        probe.clone(),
        launcher.clone(),
    )
    .unwrap();

    let err = coordinator.resolve().await.unwrap_err();
    assert!(err.is_retryable());

    // The abandoned server finishes starting on its own.
    probe.listening.store(true, Ordering::SeqCst);

    let endpoint = coordinator.resolve().await.unwrap();
    assert_eq!(endpoint, *coordinator.endpoint());
    assert_eq!(launcher.calls(), 1);
}

#[tokio::test]
async fn test_poll_detects_real_listener() {
    let port = free_port();
    let launcher = Arc::new(ScriptedLauncher::default());
    *launcher.on_launch.lock().unwrap() = Some(Box::new(move || {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            let _listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
            std::thread::sleep(Duration::from_secs(2));
        });
    }));

    let coordinator = StartupCoordinator::with_components(
        DevServerConfig::new()
            .with_port(port)
            .with_mode(ServeMode::Poll)
            .with_ready_timeout(Duration::from_secs(3)),
        Arc::new(SystemPortProbe::new()),
        launcher.clone(),
    )
    .unwrap();

    let url = coordinator.proxy_target().await.unwrap();

    assert_eq!(url.port(), Some(port));
    assert_eq!(launcher.calls(), 1);
}

#[tokio::test]
async fn test_missing_working_dir_is_launch_failure() {
    let temp_dir = TempDir::new().unwrap();
    let config = DevServerConfig::new()
        .with_port(free_port())
        .with_mode(ServeMode::Parse)
        .with_working_dir(temp_dir.path().join("ClientApp"));

    let coordinator = StartupCoordinator::new(config).unwrap();
    let err = coordinator.resolve().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Launch);
}

#[cfg(unix)]
mod real_process {
    use super::*;
    use spa_devserver::DirectExec;

    fn shell_coordinator(dir: &Path, port: u16, script: &str) -> StartupCoordinator {
        let config = DevServerConfig::new()
            .with_port(port)
            .with_mode(ServeMode::Parse)
            .with_working_dir(dir)
            .with_ready_timeout(Duration::from_secs(5));
        let launcher = ProcessLauncher::with_strategy(
            Arc::new(DirectExec),
            "sh",
            vec!["-c".to_string(), script.to_string()],
        );

        StartupCoordinator::with_components(
            config,
            Arc::new(SystemPortProbe::new()),
            Arc::new(launcher),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_child_output_marker_resolves() {
        let temp_dir = TempDir::new().unwrap();
        let port = free_port();
        let coordinator = shell_coordinator(
            temp_dir.path(),
            port,
            &format!(
                "echo building; echo 'warn' 1>&2; echo 'App running at http://localhost:{}/'; sleep 1",
                port
            ),
        );

        let endpoint = coordinator.resolve().await.unwrap();
        assert_eq!(endpoint.port(), port);
    }

    #[tokio::test]
    async fn test_child_exiting_without_marker_fails() {
        let temp_dir = TempDir::new().unwrap();
        let coordinator = shell_coordinator(
            temp_dir.path(),
            free_port(),
            "echo 'npm ERR! missing script: serve' 1>&2; exit 1",
        );

        let err = coordinator.resolve().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Stream);
    }
}
