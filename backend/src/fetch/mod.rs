//! Remote CSV retrieval.
//!
//! A plain unauthenticated `GET`; no custom headers and no retry. Any
//! transport failure or non-success status is returned as a [`FetchError`].

use std::time::Duration;

use reqwest::Url;

use crate::api::logs::{log_info, log_success};
use crate::error::{FetchError, FetchResult};

/// True when `source` looks like an `http(s)://` URL rather than a path.
pub fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Validate `url` and require an http(s) scheme.
pub fn parse_url(url: &str) -> FetchResult<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

/// Download the body of `url`.
pub async fn fetch_bytes(url: &str, timeout: Option<Duration>) -> FetchResult<Vec<u8>> {
    let url = parse_url(url)?;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    log_info(format!("🌐 Fetching {}", url));
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;
    log_success(format!("Downloaded {} bytes", body.len()));

    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/pop.csv"));
        assert!(is_url("HTTP://example.com/pop.csv"));
        assert!(!is_url("data/pop.csv"));
        assert!(!is_url("ftp://example.com/pop.csv"));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(parse_url("https://example.com/a.csv").is_ok());
        assert!(matches!(parse_url("ftp://example.com/a.csv"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(parse_url("not a url"), Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_fails_before_request() {
        let err = fetch_bytes("file:///etc/passwd", None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
