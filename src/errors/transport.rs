//! Transport errors for the consumed HTTP capability.

use std::time::Duration;

/// Errors reported by a [`crate::Transport`] implementation.
///
/// The core propagates these unchanged and never retries. The
/// [`TransportError::RateLimited`] variant is distinguished so the client can
/// convert it into a [`crate::RateLimitError`] carrying a retry deadline.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Non-success HTTP status other than throttling.
    #[error("HTTP status {status} for {path}")]
    Http { status: u16, path: String },

    /// The service throttled the request (HTTP 429).
    #[error("request throttled by the service")]
    RateLimited {
        /// Server-provided retry hint, when present.
        retry_after: Option<Duration>,
    },

    /// Connection, DNS, or body-read failure.
    #[error("network failure for {path}")]
    Network {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The base URL or joined request URL was invalid.
    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
