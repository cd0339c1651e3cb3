//! One probe invocation: fetch → parse → aggregate → evaluate → persist.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use caddyprobe_core::{ProbeConfig, ProbeEnv, Snapshot};
use caddyprobe_fetch::fetch_metrics;
use caddyprobe_metrics::{evaluate, parse_exposition, scan};
use caddyprobe_state::SnapshotStore;

use crate::report;

/// Everything a run needs, resolved from config file, environment and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub metrics_url: String,
    pub service_name: String,
    pub timeout: Duration,
    pub report_fetch_failure: bool,
    pub state_path: PathBuf,
}

impl Settings {
    pub fn new(config: &ProbeConfig, env: &ProbeEnv) -> Self {
        Self {
            metrics_url: config.metrics_url().to_string(),
            service_name: config.service_name().to_string(),
            timeout: config.timeout(),
            report_fetch_failure: config.report_fetch_failure(),
            state_path: env.state_path.clone(),
        }
    }
}

/// Run the probe once at time `now` (unix seconds).
///
/// Returns the status line to print, or `None` when the endpoint could not
/// be scraped and failure reporting is off. The snapshot is only rewritten
/// when metrics were retrieved.
pub async fn run(settings: &Settings, now: f64) -> Option<String> {
    let store = SnapshotStore::new(&settings.state_path);
    let previous = store.load_or_empty();

    let body = match fetch_metrics(&settings.metrics_url, settings.timeout).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, url = %settings.metrics_url, "metrics unavailable");
            return settings
                .report_fetch_failure
                .then(|| report::unavailable(&settings.service_name, &e));
        }
    };

    let records = parse_exposition(&body);
    let scan = scan(&records);
    debug!(records = records.len(), "exposition parsed");

    let elapsed = previous.as_ref().and_then(|s| s.elapsed_until(now));
    let measurements = evaluate(&scan.values, previous.as_ref().map(|s| &s.values), elapsed);

    let line = report::render(
        scan.status,
        &settings.service_name,
        &measurements,
        &scan.details,
    );

    if let Err(e) = store.save(&Snapshot::new(now, scan.values)) {
        warn!(error = %e, path = ?store.path(), "failed to persist snapshot");
    }

    Some(line)
}

pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
