//! Prometheus text exposition parser.
//!
//! Turns a scraped `/metrics` document into an ordered sequence of
//! [`Record`]s. Parsing never fails as a whole: comments, blank lines and
//! any line that does not match the sample grammar are skipped one by one.
//!
//! Label lists are split on raw commas and each pair on `=`. Escaped commas
//! or `=` inside quoted label values are not understood; a pair that does
//! not split into exactly one key and one value drops the whole line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use caddyprobe_core::{MetricValue, Record};

/// `name{labels} value`, labels optional. Values are unsigned decimal or
/// exponent literals; `+Inf`, `NaN`, negatives and trailing timestamps do
/// not match.
static SAMPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9_]+)(\{(.*)\})? +([0-9.e+]+) *$")
        .expect("sample line pattern is valid")
});

/// Parse a whole document into records, in document order.
pub fn parse_exposition(content: &str) -> Vec<Record> {
    records(content).collect()
}

/// Lazily parse a document, yielding records in document order.
pub fn records(content: &str) -> impl Iterator<Item = Record> + '_ {
    content.lines().filter_map(parse_line)
}

/// Parse a single exposition line. Returns `None` for comments, blank
/// lines and anything that does not match the sample grammar.
pub fn parse_line(line: &str) -> Option<Record> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let Some(caps) = SAMPLE_LINE.captures(line) else {
        debug!(line, "skipping unrecognised exposition line");
        return None;
    };

    let name = &caps[1];
    let labels = match caps.get(3) {
        Some(list) => parse_labels(list.as_str()).or_else(|| {
            debug!(line, "skipping line with malformed labels");
            None
        })?,
        None => HashMap::new(),
    };

    let Some(value) = MetricValue::parse(&caps[4]) else {
        debug!(line, "skipping line with unparseable value");
        return None;
    };

    Some(Record {
        name: name.to_string(),
        labels,
        value,
    })
}

fn parse_labels(list: &str) -> Option<HashMap<String, String>> {
    let mut labels = HashMap::new();
    if list.is_empty() {
        return Some(labels);
    }

    for pair in list.split(',') {
        let mut parts = pair.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        labels.insert(key.to_string(), strip_quotes(value).to_string());
    }
    Some(labels)
}

/// Drop one leading and one trailing `"`.
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
