//! caddy_metrics — local check reporting Caddy request rates.
//!
//! Scrapes Caddy's Prometheus endpoint, compares it with the snapshot left
//! by the previous run, and prints one status line for the monitoring
//! agent. Logs go to stderr; stdout carries only the status line.
//!
//! # Usage
//!
//! ```text
//! MK_CONFDIR=/etc/check_mk MK_VARDIR=/var/lib/check_mk_agent caddy_metrics
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use caddyprobe_core::{ProbeConfig, ProbeEnv};

mod report;
mod run;

#[derive(Parser)]
#[command(
    name = "caddy_metrics",
    about = "Caddy metrics local check",
    version
)]
struct Cli {
    /// Config file (default: $MK_CONFDIR/linet_caddy_metrics.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot file (default: $MK_VARDIR/persisted/linet_caddy_metrics.json).
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Metrics endpoint, overriding `metrics_url` from the config file.
    #[arg(long)]
    url: Option<String>,

    /// Print a CRITICAL line instead of nothing when the endpoint is unreachable.
    #[arg(long)]
    report_fetch_failure: bool,

    /// Verbose logging to stderr (same as DEBUG=1).
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = ProbeEnv::from_env();

    let filter = if cli.debug || env.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(|| env.config_path.clone());
    let config = ProbeConfig::load_or_default(&config_path);

    let mut settings = run::Settings::new(&config, &env);
    if let Some(url) = cli.url {
        settings.metrics_url = url;
    }
    if let Some(state_file) = cli.state_file {
        settings.state_path = state_file;
    }
    settings.report_fetch_failure |= cli.report_fetch_failure;

    if let Some(line) = run::run(&settings, run::now_secs()).await {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
    }

    Ok(())
}
