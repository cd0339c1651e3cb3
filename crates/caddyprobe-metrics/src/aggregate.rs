//! Selection and summation of the metrics the probe reports on.
//!
//! Every allow-listed sample is summed across all of its label combinations
//! into an [`Aggregate`] keyed by the metric name without its `caddy_http_`
//! prefix. The config-reload gauge is read separately as a health signal.

use tracing::debug;

use caddyprobe_core::{Aggregate, HealthStatus, Record};

/// Metric names summed into the aggregate. Exact match only.
pub const SUMMED_METRICS: &[&str] = &[
    "caddy_http_response_size_bytes_sum",
    "caddy_http_response_duration_seconds_sum",
    "caddy_http_requests_in_flight",
    "caddy_http_requests_total",
    "caddy_http_request_errors_total",
    "process_cpu_seconds_total",
];

/// Stripped from summed metric names to form aggregate keys.
pub const NAME_PREFIX: &str = "caddy_http_";

/// `1` when the last config reload succeeded.
pub const RELOAD_GAUGE: &str = "caddy_config_last_reload_successful";

pub const DETAIL_RELOAD_OK: &str = "last reload successful";
pub const DETAIL_RELOAD_FAILED: &str = "last reload failed";
pub const DETAIL_FALLBACK: &str = "metrics retrieved";

/// Result of scanning one document's records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    pub values: Aggregate,
    /// Human-readable details for the status line, never empty.
    pub details: Vec<String>,
    pub status: HealthStatus,
}

/// Sum the allow-listed records and read the reload gauge.
pub fn scan<'a, I>(records: I) -> Scan
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut scan = Scan::default();

    for record in records {
        if SUMMED_METRICS.contains(&record.name.as_str()) {
            let key = record
                .name
                .strip_prefix(NAME_PREFIX)
                .unwrap_or(&record.name);
            scan.values.accumulate(key, record.value);
        } else if record.name == RELOAD_GAUGE {
            if record.value.as_f64() == 1.0 {
                scan.details.push(DETAIL_RELOAD_OK.to_string());
            } else {
                scan.details.push(DETAIL_RELOAD_FAILED.to_string());
                scan.status.escalate(HealthStatus::Critical);
            }
        }
    }

    if scan.details.is_empty() {
        scan.details.push(DETAIL_FALLBACK.to_string());
    }

    debug!(values = ?scan.values, status = ?scan.status, "metrics scanned");
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposition::parse_exposition;
    use caddyprobe_core::MetricValue;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/caddy_metrics.txt");

    #[test]
    fn fixture_sums_across_labels() {
        let records = parse_exposition(FIXTURE);
        let scan = scan(&records);

        assert_eq!(scan.values.get("requests_total"), Some(MetricValue::Int(1560)));
        assert_eq!(scan.values.get("request_errors_total"), Some(MetricValue::Int(9)));
        assert_eq!(scan.values.get("requests_in_flight"), Some(MetricValue::Int(3)));
        assert_eq!(
            scan.values.get("response_duration_seconds_sum"),
            Some(MetricValue::Float(4.75))
        );
        assert_eq!(
            scan.values.get("response_size_bytes_sum"),
            Some(MetricValue::Float(1_069_056.0))
        );
        assert_eq!(
            scan.values.get("process_cpu_seconds_total"),
            Some(MetricValue::Float(12.34))
        );
        assert_eq!(scan.values.len(), 6);
        assert_eq!(scan.details, [DETAIL_RELOAD_OK]);
        assert_eq!(scan.status, HealthStatus::Ok);
    }

    #[test]
    fn keys_stay_within_allow_list() {
        let records = parse_exposition(FIXTURE);
        let scan = scan(&records);
        for key in scan.values.keys() {
            assert!(
                SUMMED_METRICS
                    .iter()
                    .any(|name| *name == key || name.strip_prefix(NAME_PREFIX) == Some(key)),
                "unexpected key {key}"
            );
        }
    }

    #[test]
    fn prefix_match_is_not_enough() {
        let records = parse_exposition(
            "caddy_http_requests_total_extra 5\ncaddy_http_request_duration_seconds_sum 1.5\n",
        );
        let scan = scan(&records);
        assert!(scan.values.is_empty());
    }

    #[test]
    fn reload_failure_is_critical() {
        let records = parse_exposition("caddy_config_last_reload_successful 0\n");
        let scan = scan(&records);
        assert_eq!(scan.status, HealthStatus::Critical);
        assert_eq!(scan.status.code(), 2);
        assert_eq!(scan.details, [DETAIL_RELOAD_FAILED]);
    }

    #[test]
    fn reload_success_as_float_counts() {
        let records = parse_exposition("caddy_config_last_reload_successful 1.0\n");
        let scan = scan(&records);
        assert_eq!(scan.status, HealthStatus::Ok);
        assert_eq!(scan.details, [DETAIL_RELOAD_OK]);
    }

    #[test]
    fn failed_reload_is_not_undone_by_later_success() {
        let records = parse_exposition(
            "caddy_config_last_reload_successful 0\ncaddy_config_last_reload_successful 1\n",
        );
        let scan = scan(&records);
        assert_eq!(scan.status, HealthStatus::Critical);
        assert_eq!(scan.details, [DETAIL_RELOAD_FAILED, DETAIL_RELOAD_OK]);
    }

    #[test]
    fn fallback_detail_when_nothing_reported() {
        let scan = scan(&parse_exposition("caddy_http_requests_total 4\n"));
        assert_eq!(scan.details, [DETAIL_FALLBACK]);

        let empty = super::scan(std::iter::empty::<&Record>());
        assert!(empty.values.is_empty());
        assert_eq!(empty.details, [DETAIL_FALLBACK]);
    }

    #[test]
    fn record_order_does_not_change_sums() {
        let mut records = parse_exposition(FIXTURE);
        let forward = scan(&records).values;
        records.reverse();
        let backward = scan(&records).values;
        records.rotate_left(7);
        let rotated = scan(&records).values;

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
    }
}
