// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Reqwest-backed transport for the index service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use super::Transport;
use crate::errors::TransportError;

const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP transport speaking to a TzPro-style index service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the given base URL, e.g.
    /// `https://api.tzpro.io`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(base_url).map_err(|source| TransportError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        // Url::join resolves against the parent of the last path segment, so
        // a base like `/api/v1` needs the trailing slash to keep its prefix.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: None,
        })
    }

    /// Attaches an API key sent with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Substitutes a preconfigured reqwest client (custom timeouts, proxies).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn request_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| TransportError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                source,
            })?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.request_url(path, query)?;
        debug!(%url, "GET");

        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| TransportError::Network {
            path: path.to_string(),
            source: Box::new(e),
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(TransportError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| TransportError::Network {
            path: path.to_string(),
            source: Box::new(e),
        })?;
        Ok(body.to_vec())
    }
}

/// Parses a `Retry-After` delta-seconds value. HTTP-date forms are ignored;
/// the caller falls back to the default retry window.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_parses_delta_seconds() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn request_url_joins_path_and_query() {
        let transport = HttpTransport::new("https://api.tzpro.io").unwrap();
        let url = transport
            .request_url(
                "/tables/contract",
                &[("limit".to_string(), "50".to_string())],
            )
            .unwrap();
        assert_eq!(url.as_str(), "https://api.tzpro.io/tables/contract?limit=50");
    }

    #[test]
    fn request_url_keeps_base_path_prefix() {
        let transport = HttpTransport::new("https://example.com/api/v1").unwrap();
        let url = transport.request_url("/tables/contract", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/tables/contract");

        // A trailing slash on the base changes nothing.
        let transport = HttpTransport::new("https://example.com/api/v1/").unwrap();
        let url = transport.request_url("tables/contract", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/tables/contract");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }
}
