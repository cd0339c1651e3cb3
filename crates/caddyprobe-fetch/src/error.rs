//! Error types for metrics retrieval.

use std::time::Duration;

use thiserror::Error;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid metrics url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("http client setup failed: {0}")]
    Client(String),

    #[error("connect to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
