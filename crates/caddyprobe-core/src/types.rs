//! Shared types used across caddyprobe crates.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A numeric sample value, keeping the literal form it was parsed from.
///
/// Integer literals stay integers through summation so that counters render
/// the way the exposition document wrote them. Any division produces a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// Parse a numeric literal. A `.` anywhere in the literal selects
    /// floating point; otherwise the literal is read as an integer, falling
    /// back to floating point for exponent forms like `1e+06`.
    pub fn parse(literal: &str) -> Option<Self> {
        if !literal.contains('.') {
            if let Ok(v) = literal.parse::<i64>() {
                return Some(MetricValue::Int(v));
            }
        }
        literal
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(MetricValue::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            MetricValue::Int(v) => v == 0,
            MetricValue::Float(v) => v == 0.0,
        }
    }

    /// Numeric `<`, exact for two integers.
    pub fn less_than(self, other: MetricValue) -> bool {
        match (self, other) {
            (MetricValue::Int(a), MetricValue::Int(b)) => a < b,
            (a, b) => a.as_f64() < b.as_f64(),
        }
    }

    /// Divide, producing `None` for a zero divisor or a non-finite result.
    pub fn checked_div(self, divisor: f64) -> Option<f64> {
        if divisor == 0.0 {
            return None;
        }
        let q = self.as_f64() / divisor;
        q.is_finite().then_some(q)
    }
}

impl Add for MetricValue {
    type Output = MetricValue;

    fn add(self, rhs: MetricValue) -> MetricValue {
        match (self, rhs) {
            (MetricValue::Int(a), MetricValue::Int(b)) => match a.checked_add(b) {
                Some(sum) => MetricValue::Int(sum),
                None => MetricValue::Float(a as f64 + b as f64),
            },
            (a, b) => MetricValue::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl Sub for MetricValue {
    type Output = MetricValue;

    fn sub(self, rhs: MetricValue) -> MetricValue {
        match (self, rhs) {
            (MetricValue::Int(a), MetricValue::Int(b)) => match a.checked_sub(b) {
                Some(diff) => MetricValue::Int(diff),
                None => MetricValue::Float(a as f64 - b as f64),
            },
            (a, b) => MetricValue::Float(a.as_f64() - b.as_f64()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing `.0` on integral floats.
            MetricValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// One sample line from an exposition document.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub value: MetricValue,
}

/// Per-name sums of the allow-listed metrics, keyed by the name with its
/// family prefix stripped. A missing key means the metric was absent from
/// the source, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate(BTreeMap<String, MetricValue>);

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.0.get(key).copied()
    }

    /// Add `value` into the running total for `key`, starting from zero.
    pub fn accumulate(&mut self, key: &str, value: MetricValue) {
        let total = self
            .0
            .entry(key.to_string())
            .or_insert(MetricValue::Int(0));
        *total = *total + value;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, MetricValue)> for Aggregate {
    fn from_iter<I: IntoIterator<Item = (K, MetricValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// The aggregate from one invocation plus the time it was taken.
///
/// Serialized as `{ "last_run_at": <seconds>, "values": { ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix timestamp (seconds, fractional) of the run that wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<f64>,
    #[serde(default)]
    pub values: Aggregate,
}

impl Snapshot {
    pub fn new(last_run_at: f64, values: Aggregate) -> Self {
        Self {
            last_run_at: Some(last_run_at),
            values,
        }
    }

    /// Seconds between this snapshot and `now`, if the snapshot is timestamped.
    ///
    /// May be zero or negative when the clock stepped backwards.
    pub fn elapsed_until(&self, now: f64) -> Option<f64> {
        self.last_run_at.map(|then| now - then)
    }
}

/// Probe result severity, encoded 0/1/2 on the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn code(self) -> u8 {
        match self {
            HealthStatus::Ok => 0,
            HealthStatus::Warning => 1,
            HealthStatus::Critical => 2,
        }
    }

    /// Raise the status to `to` if it is more severe. Never downgrades.
    pub fn escalate(&mut self, to: HealthStatus) {
        if to > *self {
            *self = to;
        }
    }
}

/// A named value derived for the current run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub name: &'static str,
    pub value: MetricValue,
}

impl Measurement {
    pub fn new(name: &'static str, value: MetricValue) -> Self {
        Self { name, value }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
