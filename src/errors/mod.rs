//! Error types for the tzquery library.
//!
//! Each failure domain has its own error type for fine-grained handling
//! ([`TransportError`], [`DecodeError`], [`RateLimitError`]), plus the unified
//! [`TzQueryError`] for callers that do not need to distinguish sources.
//!
//! Propagation policy: every error is scoped to a single call and surfaced to
//! the caller unchanged. The core never retries on its own; throttling is
//! reported as [`RateLimitError`] and retry timing is caller policy. A cache
//! miss is not an error and is represented as an `Option`.

mod decode;
mod transport;

pub use decode::DecodeError;
pub use transport::TransportError;

use crate::rate_limit::RateLimitError;

/// Unified error type for all tzquery operations.
///
/// Module-specific errors convert via `From`, so `?` propagates naturally.
/// Throttling transport failures are split out into the [`RateLimitError`]
/// variant at the conversion boundary so generic retry code can test for them
/// with [`crate::is_rate_limited`] instead of matching transport internals.
#[derive(Debug, thiserror::Error)]
pub enum TzQueryError {
    /// Network or HTTP failure from the transport collaborator.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The service throttled the request; carries the retry deadline.
    #[error("{0}")]
    RateLimit(#[from] RateLimitError),

    /// Malformed or structurally unexpected payload.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl From<TransportError> for TzQueryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::RateLimited { retry_after } => {
                TzQueryError::RateLimit(RateLimitError::after(retry_after))
            }
            other => TzQueryError::Transport(other),
        }
    }
}
