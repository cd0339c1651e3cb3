//! caddyprobe-metrics — turns a scraped Caddy `/metrics` document into
//! status-line measurements.
//!
//! # Architecture
//!
//! ```text
//! raw text
//!   └── exposition::parse_exposition() → Vec<Record>
//!         └── aggregate::scan() → Scan { values, details, status }
//!               └── rates::evaluate(values, previous, elapsed) → Vec<Measurement>
//! ```
//!
//! `Scan::values` is also what gets persisted as the next run's baseline.

pub mod aggregate;
pub mod exposition;
pub mod rates;

pub use aggregate::{Scan, scan};
pub use exposition::{parse_exposition, parse_line, records};
pub use rates::evaluate;
