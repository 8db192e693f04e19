//! Shared test helpers: a scripted transport standing in for the index
//! service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tzquery::errors::TransportError;
use tzquery::Transport;

/// Recorded request: path plus query parameters.
pub type RecordedCall = (String, Vec<(String, String)>);

/// Installs a fmt subscriber honoring `RUST_LOG`; safe to call from every
/// test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Transport replaying a scripted sequence of responses and recording every
/// request it receives.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(
        responses: impl IntoIterator<Item = Result<Vec<u8>, TransportError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Scripts a sequence of successful JSON bodies.
    pub fn with_bodies(bodies: &[&str]) -> Self {
        Self::new(bodies.iter().map(|b| Ok(b.as_bytes().to_vec())))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Query parameter value of the `index`-th recorded call, if present.
    pub fn query_param(&self, index: usize, key: &str) -> Option<String> {
        self.calls.lock().unwrap().get(index).and_then(|(_, query)| {
            query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Http {
                    status: 404,
                    path: path.to_string(),
                })
            })
    }
}
