// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Cooperative rate-limit backoff signal.
//!
//! When the transport reports throttling, the client wraps it into a
//! [`RateLimitError`] carrying an absolute retry deadline. The core never
//! retries on its own; it supplies the wait primitives a caller's retry loop
//! needs to race the deadline against its own cancellation signal.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Conservative retry window applied when the server gives no hint.
pub const DEFAULT_RETRY_WINDOW: Duration = Duration::from_secs(10);

/// Throttling signal with an absolute deadline after which a retry is
/// expected to succeed.
///
/// The wait primitives resolve exactly once and never after the deadline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("rate limited, retry expected within {window:?}")]
pub struct RateLimitError {
    deadline: Instant,
    window: Duration,
}

/// Result of racing the retry deadline against an external cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome<C> {
    /// The deadline passed; a retry is expected to succeed.
    Ready,
    /// The external cancellation fired first; carries its output.
    Cancelled(C),
}

impl<C> WaitOutcome<C> {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled(_))
    }
}

impl RateLimitError {
    /// Builds a signal from a server retry hint, falling back to
    /// [`DEFAULT_RETRY_WINDOW`] when the hint is absent.
    pub fn after(retry_after: Option<Duration>) -> Self {
        let window = retry_after.unwrap_or(DEFAULT_RETRY_WINDOW);
        Self {
            deadline: Instant::now() + window,
            window,
        }
    }

    /// Absolute time after which a retry is expected to succeed.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time remaining until the deadline; zero once it has passed.
    pub fn retry_in(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Resolves when the retry deadline has passed. Fires exactly once, at
    /// or before the deadline, and immediately if it already passed.
    pub async fn wait_ready(&self) {
        sleep_until(self.deadline).await;
    }

    /// Races the retry deadline against an externally supplied cancellation
    /// future, resolving with whichever fires first. Neither side aborts any
    /// network operation already in flight.
    pub async fn wait_ready_or<F>(&self, cancel: F) -> WaitOutcome<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            _ = sleep_until(self.deadline) => WaitOutcome::Ready,
            out = cancel => WaitOutcome::Cancelled(out),
        }
    }
}

/// Extracts the rate-limit signal from a unified error, if that is what it
/// is. Lets generic retry code test for throttling without matching concrete
/// error variants.
pub fn is_rate_limited(err: &crate::errors::TzQueryError) -> Option<&RateLimitError> {
    match err {
        crate::errors::TzQueryError::RateLimit(rl) => Some(rl),
        _ => None,
    }
}
