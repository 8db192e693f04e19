//! Async client for TzPro-style blockchain index APIs.
//!
//! The index service exposes two kinds of read surfaces: explorer endpoints
//! returning self-describing JSON objects, and table endpoints returning
//! column-compact arrays-of-arrays plus a column header. This crate provides
//! the generic machinery shared by every typed entity wrapper:
//!
//! - a statically registered column-to-field [`TypeDescriptor`] per entity,
//! - a columnar decoder handling both wire shapes,
//! - an immutable, chainable [`QuerySpec`] with canonical rendering,
//! - cursor-based pagination over open-ended result streams,
//! - a cooperative rate-limit signal ([`RateLimitError`]),
//! - a bounded, single-flight [`ScriptCache`] for contract script metadata.

mod client;
mod contract;
mod decode;
mod descriptor;
mod dex;
pub mod errors;
mod paginate;
mod query;
mod rate_limit;
mod script;
mod script_cache;
pub mod transport;

pub use client::*;
pub use contract::*;
pub use decode::*;
pub use descriptor::*;
pub use dex::*;
pub use errors::{DecodeError, TransportError, TzQueryError};
pub use paginate::*;
pub use query::*;
pub use rate_limit::*;
pub use script::*;
pub use script_cache::*;
pub use transport::{HttpTransport, Transport};
