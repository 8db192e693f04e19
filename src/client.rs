//! Session handle tying the transport, configuration, and caches together.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::decode::{decode_rows, DecodePolicy, ResultPage};
use crate::descriptor::TableEntity;
use crate::errors::{DecodeError, TransportError, TzQueryError};
use crate::paginate::Paginator;
use crate::query::{FilterOp, Order, QuerySpec};
use crate::script_cache::{ScriptCache, DEFAULT_SCRIPT_CACHE_CAPACITY};
use crate::transport::{HttpTransport, Transport};

/// Client-side knobs. The script cache and decode policy are per-client, not
/// process-wide; two clients never share cached state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server-declared page-size ceiling applied to every table query.
    pub max_page_size: u32,
    /// Number of contract scripts kept resident per client.
    pub script_cache_capacity: usize,
    /// Unknown-column handling for table decodes.
    pub decode_policy: DecodePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_page_size: QuerySpec::DEFAULT_MAX_PAGE_SIZE,
            script_cache_capacity: DEFAULT_SCRIPT_CACHE_CAPACITY,
            decode_policy: DecodePolicy::default(),
        }
    }
}

/// Handle to one index service.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and the only
/// mutable state is the script cache, which is internally synchronized.
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    scripts: ScriptCache,
}

impl Client {
    /// Creates a client over an existing transport with default
    /// configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let scripts = ScriptCache::new(config.script_cache_capacity);
        Self {
            transport,
            config,
            scripts,
        }
    }

    /// Convenience constructor over [`HttpTransport`].
    pub fn http(base_url: &str) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url)?)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The per-client script metadata cache.
    pub fn scripts(&self) -> &ScriptCache {
        &self.scripts
    }

    /// Starts a table query for entity `T`.
    pub fn table<T: TableEntity>(&self) -> TableQuery<T> {
        TableQuery {
            transport: self.transport.clone(),
            policy: self.config.decode_policy,
            spec: QuerySpec::new().with_max_page_size(self.config.max_page_size),
            _entity: PhantomData,
        }
    }

    /// GET an explorer endpoint and deserialize its self-describing JSON
    /// response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, TzQueryError> {
        let payload = self.transport.get(path, query).await?;
        let value = serde_json::from_slice(&payload).map_err(DecodeError::from)?;
        Ok(value)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("scripts", &self.scripts)
            .finish_non_exhaustive()
    }
}

/// A typed query against one table endpoint.
///
/// Wraps a [`QuerySpec`] with the transport and decode policy; the `with_*`
/// builders delegate to the spec and keep the value-semantics contract, so a
/// query can be cloned and advanced from several cursors concurrently.
pub struct TableQuery<T: TableEntity> {
    transport: Arc<dyn Transport>,
    policy: DecodePolicy,
    spec: QuerySpec,
    _entity: PhantomData<fn() -> T>,
}

impl<T: TableEntity> Clone for TableQuery<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            policy: self.policy,
            spec: self.spec.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: TableEntity> TableQuery<T> {
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl ToString,
    ) -> Self {
        self.spec = self.spec.with_filter(field, op, value);
        self
    }

    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec = self.spec.with_columns(names);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.spec = self.spec.with_order(order);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.spec = self.spec.with_limit(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.spec = self.spec.with_cursor(cursor);
        self
    }

    /// Executes the query once and decodes the resulting page.
    pub async fn run(&self) -> Result<ResultPage<T>, TzQueryError> {
        let path = format!("/tables/{}", T::TABLE);
        let payload = self
            .transport
            .get(&path, &self.spec.query_params())
            .await?;
        let page = decode_rows(&payload, self.spec.columns(), self.policy)?;
        Ok(page)
    }

    /// Turns the query into a cursor paginator starting at the spec's
    /// current cursor.
    pub fn paginate(self) -> Paginator<T> {
        Paginator::new(self)
    }
}
