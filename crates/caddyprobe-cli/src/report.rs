//! Status line rendering for the monitoring agent.
//!
//! `<code> '<service>' <key=value|key=value or -> <detail; detail>`

use std::fmt::Display;

use caddyprobe_core::{HealthStatus, Measurement};

pub fn render(
    status: HealthStatus,
    service_name: &str,
    measurements: &[Measurement],
    details: &[String],
) -> String {
    let perf = if measurements.is_empty() {
        "-".to_string()
    } else {
        measurements
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|")
    };

    format!(
        "{} '{}' {} {}",
        status.code(),
        service_name,
        perf,
        details.join("; ")
    )
}

/// Line printed when the endpoint could not be scraped and reporting of
/// that case is enabled.
pub fn unavailable(service_name: &str, reason: &impl Display) -> String {
    format!(
        "{} '{}' - metrics unavailable: {}",
        HealthStatus::Critical.code(),
        service_name,
        reason
    )
}
