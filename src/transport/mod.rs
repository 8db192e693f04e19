// SPDX-FileCopyrightText: 2026 tzquery contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Transport boundary consumed by the client.
//!
//! The core only needs one capability: perform a GET against the service and
//! return the raw payload bytes or a structured [`TransportError`], with
//! throttling reported as its own variant. [`HttpTransport`] is the default
//! reqwest-backed implementation; tests substitute scripted mocks.

mod http;

use async_trait::async_trait;

pub use http::HttpTransport;

use crate::errors::TransportError;

/// The GET capability the core consumes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET for `path` with the given query parameters and returns
    /// the raw response body.
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError>;
}
