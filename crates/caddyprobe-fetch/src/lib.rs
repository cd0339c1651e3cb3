//! caddyprobe-fetch — retrieval of the raw exposition document.
//!
//! One GET per run over `http://` or `https://` (rustls), following
//! redirects, bounded by a single timeout that covers connecting, the
//! request, and reading the body, and by a maximum body size. Anything other
//! than a final `200` is a [`FetchError`]; callers decide whether that means
//! silence or an alert.

pub mod client;
pub mod error;

pub use client::{MAX_BODY_BYTES, fetch_metrics};
pub use error::{FetchError, FetchResult};
