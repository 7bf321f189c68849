//! Pulsewatch CLI
//!
//! Runs the monitoring engine standalone, mostly for demos and smoke
//! testing; real deployments embed [`pulsewatch::monitor::HealthMonitor`]
//! inside their own service.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use pulsewatch::catalog::{default_policies, default_thresholds};
use pulsewatch::models::MetricType;
use pulsewatch::monitor::HealthMonitor;
use pulsewatch::Config;

/// Pulsewatch - Health monitoring and alerting
#[derive(Parser)]
#[command(name = "pulsewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring scheduler until interrupted
    Run {
        /// Seconds between health check ticks
        #[arg(long, default_value = "30", env = "PULSEWATCH_INTERVAL")]
        interval: u64,

        /// Feed a synthetic workload so alerts fire and resolve
        #[arg(long)]
        demo: bool,
    },

    /// Print the default threshold and escalation catalogs
    Catalog {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Run { interval, demo } => run_monitor(interval, demo).await,
        Commands::Catalog { format } => print_catalog(format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_monitor(interval: u64, demo: bool) -> anyhow::Result<()> {
    let mut config = Config::default();
    config.monitor.check_interval_seconds = interval;

    let monitor = Arc::new(HealthMonitor::new(config));

    info!(interval, demo, "Starting Pulsewatch");

    let runner = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.start().await })
    };

    let producer = demo.then(|| {
        let monitor = monitor.clone();
        tokio::spawn(async move { demo_producer(&monitor).await })
    });

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    if let Some(producer) = producer {
        producer.abort();
    }
    monitor.stop().await;
    runner.await?;

    Ok(())
}

/// Sawtooth cpu workload for one synthetic entity; climbs through the
/// warning and critical bands, then recovers so auto-resolution kicks in
async fn demo_producer(monitor: &HealthMonitor) {
    const VALUES: [f64; 8] = [45.0, 60.0, 75.0, 88.0, 93.0, 96.0, 80.0, 50.0];

    let mut step = 0usize;
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(5));

    loop {
        ticker.tick().await;
        let value = VALUES[step % VALUES.len()];
        step += 1;

        if let Err(e) =
            monitor.record_metric("demo-node", MetricType::CpuUsage, value, "%", Utc::now())
        {
            tracing::warn!(error = %e, "Demo sample rejected");
        }
    }
}

fn print_catalog(format: OutputFormat) -> anyhow::Result<()> {
    let thresholds = default_thresholds();
    let policies = default_policies();

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "thresholds": thresholds,
                "escalation_policies": policies,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("Thresholds (warning / critical / emergency):");
            for t in &thresholds {
                println!(
                    "  {:<14} {:>8.1} / {:>8.1} / {:>8.1}",
                    t.metric.to_string(),
                    t.warning,
                    t.critical,
                    t.emergency
                );
            }
            println!();
            println!("Escalation ladder:");
            for p in &policies {
                println!(
                    "  {} after {:>3}m -> {}",
                    p.level,
                    p.delay_minutes,
                    p.contacts.join(", ")
                );
            }
        }
    }

    Ok(())
}
