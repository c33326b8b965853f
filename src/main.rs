//! Mouse Bridge
//!
//! Drive the host mouse pointer from a serial-connected microcontroller.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mouse_bridge::bridge::{Bridge, BridgeSettings, BridgeStats};
use mouse_bridge::config::{AppConfig, ConfigOverrides, SerialConfig};
use mouse_bridge::paths::AppPaths;
use mouse_bridge::pointer::{ConsolePointer, EnigoPointer};
use mouse_bridge::transport::{self, SerialTransport};
use mouse_bridge::{MotionRounding, TriggerPolicy};

/// Mouse Bridge - move the pointer from `dx,dy,L,R` serial reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to ./config.yaml or the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device (e.g. /dev/ttyACM0, COM5)
    #[arg(short, long, env = "MOUSE_BRIDGE_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, env = "MOUSE_BRIDGE_BAUD")]
    baud: Option<u32>,

    /// Multiplier applied to motion deltas
    #[arg(short, long, allow_negative_numbers = true)]
    scale: Option<f64>,

    /// Button trigger mode
    #[arg(short, long, value_enum)]
    trigger: Option<TriggerPolicy>,

    /// How scaled motion is converted to whole pixels
    #[arg(long, value_enum)]
    rounding: Option<MotionRounding>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log pointer actions instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// List available serial ports
    #[arg(long)]
    list_ports: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port.clone(),
            baud: self.baud,
            scale: self.scale,
            trigger: self.trigger,
            rounding: self.rounding,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        transport::list_ports_formatted()?;
        return Ok(());
    }

    let config = load_config(&args).await?;
    info!(
        "Starting Mouse Bridge on {} @ {} baud",
        config.serial.port, config.serial.baud
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let worker_shutdown = shutdown.clone();
    let serial = config.serial.clone();
    let settings = BridgeSettings::from(&config.pointer);
    let dry_run = args.dry_run;

    // The bridge loop blocks on serial reads, keep it off the async workers
    let mut worker = tokio::task::spawn_blocking(move || {
        run_bridge(&serial, settings, dry_run, &worker_shutdown)
    });

    let stats = tokio::select! {
        res = &mut worker => res.context("Bridge thread panicked")??,
        res = shutdown_signal() => {
            res?;
            shutdown.store(true, Ordering::Relaxed);
            let stats = worker.await.context("Bridge thread panicked")??;
            println!("\nStopped.");
            stats
        }
    };

    info!(
        "Bridge stopped: {} frames, {} skipped lines, {} moves, {} button actions, {} injection errors",
        stats.frames, stats.skipped, stats.motions, stats.button_actions, stats.injection_errors
    );

    Ok(())
}

/// Resolve the config file, apply CLI overrides and validate.
async fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path).await?,
        None => {
            let paths = AppPaths::detect();
            if paths.config.exists() {
                info!("Configuration file: {}", paths.config.display());
                AppConfig::load(&paths.config).await?
            } else {
                debug!("No config file at {}, using defaults", paths.config.display());
                AppConfig::default()
            }
        }
    };

    config.apply_overrides(args.overrides());
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// Open the port, pick a pointer backend and run until shutdown.
fn run_bridge(
    serial: &SerialConfig,
    settings: BridgeSettings,
    dry_run: bool,
    shutdown: &AtomicBool,
) -> Result<BridgeStats> {
    let transport = SerialTransport::open(serial)?;
    info!("Listening on {}... (Ctrl+C to quit)", transport.port_name());

    let stats = if dry_run {
        info!("Dry run: pointer actions are logged, not injected");
        Bridge::new(transport, ConsolePointer::new(), settings).run(shutdown)?
    } else {
        let pointer = EnigoPointer::new()?;
        Bridge::new(transport, pointer, settings).run(shutdown)?
    };

    Ok(stats)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to install CTRL+C signal handler")?;
    info!("Shutdown signal received");
    Ok(())
}
