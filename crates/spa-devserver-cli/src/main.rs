//! SPA Devserver CLI - start the front-end development server and print its URL.
//!
//! Scripts and test harnesses run this binary, read the `DEV_SERVER_URL=` line
//! from stdout and point their proxy or browser at it.

use anyhow::{Context, Result};
use clap::Parser;
use spa_devserver::{DevServerConfig, ServeMode, StartupCoordinator};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "spa-devserver")]
#[command(about = "Start a SPA development server and wait until it is ready")]
struct Args {
    /// Port the development server listens on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Readiness strategy: parse, poll or isolated
    #[arg(short, long, default_value = "poll", value_parser = parse_mode)]
    mode: ServeMode,

    /// Directory the tool is started in
    #[arg(long, default_value = "ClientApp")]
    working_dir: PathBuf,

    /// Tool executable
    #[arg(long, default_value = "npm")]
    tool: String,

    /// Seconds to wait for readiness
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// Stdout substring that marks the server as ready (parse mode)
    #[arg(long, default_value = "running at")]
    marker: String,

    /// Milliseconds between port checks (poll and isolated modes)
    #[arg(long, default_value = "50")]
    poll_interval_ms: u64,

    /// Keep running until Ctrl-C (always on in parse mode)
    #[arg(short, long)]
    follow: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Arguments passed to the tool (defaults to `run serve`)
    #[arg(last = true)]
    script_args: Vec<String>,
}

fn parse_mode(value: &str) -> std::result::Result<ServeMode, String> {
    value.parse::<ServeMode>().map_err(|e| e.to_string())
}

impl Args {
    /// Whether to wait for Ctrl-C after printing the URL.
    ///
    /// In parse mode this process holds the server's pipes; exiting would
    /// close them and the server would die on its next write.
    fn stays_attached(&self) -> bool {
        self.follow || self.mode.redirects_output()
    }

    fn into_config(self) -> DevServerConfig {
        let mut config = DevServerConfig::new()
            .with_port(self.port)
            .with_mode(self.mode)
            .with_working_dir(&self.working_dir)
            .with_tool(self.tool)
            .with_ready_timeout(Duration::from_secs(self.timeout_secs))
            .with_ready_marker(self.marker)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms));

        if !self.script_args.is_empty() {
            config = config.with_script_args(self.script_args);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let attached = args.stays_attached();
    let config = args.into_config();
    info!(
        "Starting `{} {}` in {} ({} mode, port {})",
        config.tool,
        config.script_args.join(" "),
        config.working_dir.display(),
        config.mode,
        config.port
    );

    let coordinator = StartupCoordinator::new(config).context("invalid configuration")?;
    let endpoint = coordinator
        .resolve()
        .await
        .context("development server did not start")?;

    // Print URL for the calling script to read (intentional stdout)
    println!("DEV_SERVER_URL={}", endpoint);

    if attached {
        info!("Relaying development server output, press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received, exiting");
    }

    Ok(())
}
