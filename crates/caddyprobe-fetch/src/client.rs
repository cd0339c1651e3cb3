//! HTTP(S) GET of the metrics endpoint.

use std::error::Error as _;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Largest exposition document accepted. Caddy's output is a few hundred
/// kilobytes at most, even with many hosts and handlers.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Fetch the exposition document at `url`.
///
/// `http://` and `https://` URLs are supported and redirects are followed.
/// The whole exchange, body included, must finish within `timeout`. A
/// non-UTF-8 body is decoded lossily.
pub async fn fetch_metrics(url: &str, timeout: Duration) -> FetchResult<String> {
    fetch_limited(url, timeout, MAX_BODY_BYTES).await
}

async fn fetch_limited(url: &str, timeout: Duration, limit: usize) -> FetchResult<String> {
    let target = parse_url(url)?;

    let result = tokio::time::timeout(timeout, get(target, limit)).await;

    match result {
        Ok(Ok(body)) => {
            debug!(%url, bytes = body.len(), "metrics fetched");
            Ok(body)
        }
        Ok(Err(e)) => {
            debug!(error = %e, %url, "metrics fetch failed");
            Err(e)
        }
        Err(_) => {
            debug!(%url, "metrics fetch timed out");
            Err(FetchError::Timeout(timeout))
        }
    }
}

fn parse_url(url: &str) -> FetchResult<Url> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}

async fn get(target: Url, limit: usize) -> FetchResult<String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("caddyprobe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Client(describe(&e)))?;

    let address = format!(
        "{}:{}",
        target.host_str().unwrap_or_default(),
        target.port_or_known_default().unwrap_or_default()
    );

    let mut resp = client
        .get(target)
        .header(ACCEPT, "text/plain")
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                FetchError::Connect {
                    address,
                    reason: describe(&e),
                }
            } else {
                FetchError::Request(describe(&e))
            }
        })?;

    if resp.status() != StatusCode::OK {
        return Err(FetchError::Status(resp.status().as_u16()));
    }

    if resp.content_length().is_some_and(|len| len > limit as u64) {
        return Err(FetchError::BodyTooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| FetchError::Body(describe(&e)))?
    {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::BodyTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// reqwest keeps the useful part (refused, dns, tls) in the source chain.
fn describe(e: &reqwest::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
