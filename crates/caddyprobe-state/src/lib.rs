//! caddyprobe-state — persistence of the previous run's snapshot.
//!
//! A single JSON document of the form
//! `{ "last_run_at": <seconds>, "values": { <key>: <number>, ... } }`
//! is read once at the start of a run and overwritten once at the end.
//!
//! There is no locking. Two overlapping runs against the same file race and
//! the later writer wins; the probe is expected to be scheduled serially.

pub mod error;
pub mod store;

pub use error::{StateError, StateResult};
pub use store::SnapshotStore;
