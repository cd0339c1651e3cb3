//! Rate derivation against the previous run's aggregate.
//!
//! Rates are only computed when the previous aggregate is comparable with
//! the current one and a positive amount of time has passed. A missing
//! `requests_total` on either side, or a current `requests_total` below the
//! previous one (counter reset after a restart), discards the previous
//! aggregate for this run. Each rate is then guarded on its own: missing
//! operands, a zero request delta, or a negative result suppress it.

use tracing::debug;

use caddyprobe_core::{Aggregate, Measurement, MetricValue};

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUEST_ERRORS_TOTAL: &str = "request_errors_total";
pub const REQUESTS_IN_FLIGHT: &str = "requests_in_flight";
pub const RESPONSE_DURATION_SUM: &str = "response_duration_seconds_sum";
pub const RESPONSE_SIZE_SUM: &str = "response_size_bytes_sum";

pub const REQUESTS_PER_SECOND: &str = "requests_per_second";
pub const ERROR_RATE: &str = "error_rate";
pub const AVERAGE_REQUEST_TIME: &str = "average_request_time";
pub const DATA_TRANSFER_RATE: &str = "data_transfer_rate";
pub const REQUEST_TRANSFER_RATE: &str = "request_transfer_rate";
pub const ACTIVE: &str = "active";
pub const ACCEPTED_CONNECTIONS: &str = "accepted_connections";

/// Return `previous` only if it can be compared against `current`.
pub fn comparable_baseline<'a>(
    current: &Aggregate,
    previous: Option<&'a Aggregate>,
) -> Option<&'a Aggregate> {
    let previous = previous?;
    let now = current.get(REQUESTS_TOTAL)?;
    let then = previous.get(REQUESTS_TOTAL)?;
    if now.less_than(then) {
        debug!(%now, %then, "requests_total went backwards, ignoring previous snapshot");
        return None;
    }
    Some(previous)
}

/// Derive the measurements for this run.
///
/// `elapsed` is the number of seconds since `previous` was taken, `None`
/// when unknown. Rates come first in a fixed order, followed by the
/// instantaneous `active` and `accepted_connections`.
pub fn evaluate(
    current: &Aggregate,
    previous: Option<&Aggregate>,
    elapsed: Option<f64>,
) -> Vec<Measurement> {
    let mut out = Vec::new();

    match (comparable_baseline(current, previous), elapsed) {
        (Some(baseline), Some(secs)) if secs > 0.0 => {
            push_rates(&mut out, current, baseline, secs);
        }
        (Some(_), _) => debug!(?elapsed, "no positive interval since previous snapshot"),
        (None, _) => {}
    }

    if let Some(in_flight) = current.get(REQUESTS_IN_FLIGHT) {
        out.push(Measurement::new(ACTIVE, in_flight));
    }
    if let Some(requests) = current.get(REQUESTS_TOTAL) {
        out.push(Measurement::new(ACCEPTED_CONNECTIONS, requests));
    }

    out
}

fn push_rates(out: &mut Vec<Measurement>, current: &Aggregate, previous: &Aggregate, secs: f64) {
    let requests = delta(current, previous, REQUESTS_TOTAL);
    emit(out, REQUESTS_PER_SECOND, requests.and_then(|d| d.checked_div(secs)));

    // Per-request averages need requests to have changed.
    let per_request = requests.filter(|d| !d.is_zero()).map(MetricValue::as_f64);

    let errors = delta(current, previous, REQUEST_ERRORS_TOTAL);
    emit(out, ERROR_RATE, errors.and_then(|d| d.checked_div(secs)));

    let duration = delta(current, previous, RESPONSE_DURATION_SUM);
    emit(
        out,
        AVERAGE_REQUEST_TIME,
        duration.zip(per_request).and_then(|(d, n)| d.checked_div(n)),
    );

    let size = delta(current, previous, RESPONSE_SIZE_SUM);
    emit(out, DATA_TRANSFER_RATE, size.and_then(|d| d.checked_div(secs)));
    emit(
        out,
        REQUEST_TRANSFER_RATE,
        size.zip(per_request).and_then(|(d, n)| d.checked_div(n)),
    );
}

fn delta(current: &Aggregate, previous: &Aggregate, key: &str) -> Option<MetricValue> {
    Some(current.get(key)? - previous.get(key)?)
}

fn emit(out: &mut Vec<Measurement>, name: &'static str, rate: Option<f64>) {
    if let Some(rate) = rate.filter(|r| *r >= 0.0) {
        out.push(Measurement::new(name, MetricValue::Float(rate)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(pairs: &[(&str, MetricValue)]) -> Aggregate {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn names(measurements: &[Measurement]) -> Vec<&'static str> {
        measurements.iter().map(|m| m.name).collect()
    }

    fn value_of(measurements: &[Measurement], name: &str) -> Option<MetricValue> {
        measurements.iter().find(|m| m.name == name).map(|m| m.value)
    }

    fn full(requests: i64, errors: i64, duration: f64, size: i64, in_flight: i64) -> Aggregate {
        aggregate(&[
            (REQUESTS_TOTAL, MetricValue::Int(requests)),
            (REQUEST_ERRORS_TOTAL, MetricValue::Int(errors)),
            (RESPONSE_DURATION_SUM, MetricValue::Float(duration)),
            (RESPONSE_SIZE_SUM, MetricValue::Int(size)),
            (REQUESTS_IN_FLIGHT, MetricValue::Int(in_flight)),
        ])
    }

    #[test]
    fn requests_per_second_over_a_minute() {
        let previous = aggregate(&[(REQUESTS_TOTAL, MetricValue::Int(100))]);
        let current = aggregate(&[
            (REQUESTS_TOTAL, MetricValue::Int(160)),
            (REQUESTS_IN_FLIGHT, MetricValue::Int(3)),
        ]);

        let out = evaluate(&current, Some(&previous), Some(60.0));
        assert_eq!(
            out,
            [
                Measurement::new(REQUESTS_PER_SECOND, MetricValue::Float(1.0)),
                Measurement::new(ACTIVE, MetricValue::Int(3)),
                Measurement::new(ACCEPTED_CONNECTIONS, MetricValue::Int(160)),
            ]
        );
    }

    #[test]
    fn all_rates_in_fixed_order() {
        let previous = full(100, 4, 10.0, 1000, 0);
        let current = full(200, 6, 30.0, 51000, 2);

        let out = evaluate(&current, Some(&previous), Some(50.0));
        assert_eq!(
            names(&out),
            [
                REQUESTS_PER_SECOND,
                ERROR_RATE,
                AVERAGE_REQUEST_TIME,
                DATA_TRANSFER_RATE,
                REQUEST_TRANSFER_RATE,
                ACTIVE,
                ACCEPTED_CONNECTIONS,
            ]
        );
        assert_eq!(value_of(&out, REQUESTS_PER_SECOND), Some(MetricValue::Float(2.0)));
        assert_eq!(value_of(&out, ERROR_RATE), Some(MetricValue::Float(0.04)));
        assert_eq!(value_of(&out, AVERAGE_REQUEST_TIME), Some(MetricValue::Float(0.2)));
        assert_eq!(value_of(&out, DATA_TRANSFER_RATE), Some(MetricValue::Float(1000.0)));
        assert_eq!(value_of(&out, REQUEST_TRANSFER_RATE), Some(MetricValue::Float(500.0)));
    }

    #[test]
    fn counter_reset_drops_all_rates() {
        let previous = full(100, 4, 10.0, 1000, 0);
        let current = aggregate(&[(REQUESTS_TOTAL, MetricValue::Int(90))]);

        let out = evaluate(&current, Some(&previous), Some(60.0));
        assert_eq!(
            out,
            [Measurement::new(ACCEPTED_CONNECTIONS, MetricValue::Int(90))]
        );
    }

    #[test]
    fn counter_reset_keeps_instantaneous_values() {
        let previous = full(100, 4, 10.0, 1000, 0);
        let current = full(5, 0, 0.1, 10, 7);

        let out = evaluate(&current, Some(&previous), Some(60.0));
        assert_eq!(names(&out), [ACTIVE, ACCEPTED_CONNECTIONS]);
        assert_eq!(value_of(&out, ACTIVE), Some(MetricValue::Int(7)));
    }

    #[test]
    fn zero_request_delta_suppresses_per_request_values() {
        let previous = full(100, 4, 10.0, 1000, 0);
        let current = full(100, 4, 10.0, 1000, 0);

        let out = evaluate(&current, Some(&previous), Some(60.0));
        assert_eq!(
            names(&out),
            [REQUESTS_PER_SECOND, ERROR_RATE, DATA_TRANSFER_RATE, ACTIVE, ACCEPTED_CONNECTIONS]
        );
        assert_eq!(value_of(&out, REQUESTS_PER_SECOND), Some(MetricValue::Float(0.0)));
        for m in &out {
            assert!(m.value.as_f64().is_finite(), "{m}");
        }
    }

    #[test]
    fn first_run_has_no_rates() {
        let current = full(100, 4, 10.0, 1000, 1);
        let out = evaluate(&current, None, None);
        assert_eq!(names(&out), [ACTIVE, ACCEPTED_CONNECTIONS]);
    }

    #[test]
    fn missing_or_non_positive_interval_has_no_rates() {
        let previous = full(100, 4, 10.0, 1000, 0);
        let current = full(160, 4, 12.0, 2000, 0);
        for elapsed in [None, Some(0.0), Some(-30.0)] {
            let out = evaluate(&current, Some(&previous), elapsed);
            assert_eq!(names(&out), [ACTIVE, ACCEPTED_CONNECTIONS], "{elapsed:?}");
        }
    }

    #[test]
    fn missing_requests_total_discards_baseline() {
        let previous = aggregate(&[(REQUEST_ERRORS_TOTAL, MetricValue::Int(1))]);
        let current = full(160, 4, 12.0, 2000, 0);
        assert!(comparable_baseline(&current, Some(&previous)).is_none());

        let previous = full(100, 1, 1.0, 10, 0);
        let current = aggregate(&[(REQUEST_ERRORS_TOTAL, MetricValue::Int(2))]);
        assert!(comparable_baseline(&current, Some(&previous)).is_none());
        assert!(evaluate(&current, Some(&previous), Some(60.0)).is_empty());
    }

    #[test]
    fn error_counter_going_backwards_is_not_emitted() {
        let previous = full(100, 10, 1.0, 10, 0);
        let current = full(120, 3, 2.0, 20, 0);

        let out = evaluate(&current, Some(&previous), Some(10.0));
        assert_eq!(value_of(&out, ERROR_RATE), None);
        assert_eq!(value_of(&out, REQUESTS_PER_SECOND), Some(MetricValue::Float(2.0)));
    }

    #[test]
    fn rates_need_both_operands() {
        let previous = aggregate(&[(REQUESTS_TOTAL, MetricValue::Int(100))]);
        let current = full(160, 4, 12.0, 2000, 0);

        let out = evaluate(&current, Some(&previous), Some(60.0));
        assert_eq!(names(&out), [REQUESTS_PER_SECOND, ACTIVE, ACCEPTED_CONNECTIONS]);
    }
}
