// # ddnsd - DDNS Daemon
//
// Thin integration layer: all reconciliation logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Parsing the command line
// 2. Initializing logging
// 3. Loading the configuration once to learn the interval
// 4. Wiring the IP source, Gcore provider factory and engine
// 5. Running the scheduler until dry-run completion or a shutdown signal
//
// ## Configuration
//
// - `GCORE_CONFIG_PATH`: YAML configuration file (default: `config.yaml`)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default: `info`)
//
// The configuration file is re-read at the start of every cycle, so record
// and API key edits apply without a restart. `interval_minutes` is read once
// at startup.
//
// ## Example
//
// ```bash
// export GCORE_CONFIG_PATH=/etc/ddns/config.yaml
// ddnsd --dry-run
// ddnsd
// ```

use anyhow::Result;
use clap::Parser;
use ddns_core::config::{ConfigSource, FileConfigSource};
use ddns_core::{DdnsEngine, Scheduler, TokioSleeper};
use ddns_ip_http::HttpIpSource;
use ddns_provider_gcore::GcoreFactory;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Gcore DDNS updater
#[derive(Debug, Parser)]
#[command(name = "ddnsd", version, about = "Gcore DDNS updater")]
struct Cli {
    /// Perform a single cycle without making API calls to the DNS provider
    #[arg(long)]
    dry_run: bool,
}

/// Parse a log level name
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // The interval is only known from the configuration, so a failed first
    // load is fatal.
    let config_source = FileConfigSource::from_env();
    let interval = match config_source.load().and_then(|config| config.interval()) {
        Ok(interval) => interval,
        Err(e) => {
            error!("Configuration error ({}): {}", config_source.path().display(), e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // One logical sequence of work: a current-thread runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(cli, config_source, interval).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(cli: Cli, config_source: FileConfigSource, interval: Duration) -> Result<()> {
    info!(
        "Starting ddnsd (config: {}, dry run: {})",
        config_source.path().display(),
        cli.dry_run
    );

    let ip_source = HttpIpSource::new()?;
    let engine = DdnsEngine::new(
        Box::new(config_source),
        Box::new(ip_source),
        Box::new(GcoreFactory::new()),
        cli.dry_run,
    );

    let scheduler = Scheduler::new(engine, TokioSleeper, interval, cli.dry_run);
    let cycles = scheduler.run_until(wait_for_shutdown()).await;

    info!("Daemon stopped after {} cycle(s)", cycles);
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// If the handlers cannot be installed the daemon keeps running; it can
/// still be killed.
#[cfg(unix)]
async fn wait_for_shutdown() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to set up signal handlers: {}", e);
                return std::future::pending().await;
            }
        };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
