//! Document store adapter.
//!
//! Documents are JSON objects addressed by a store-wide [`DocumentKey`] inside
//! a named collection. The store owns the connection (a Postgres pool or an
//! in-process map) and a cache of collection handles, so a collection is set
//! up at most once per process.

pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod postgres;
pub mod query;

use futures_util::stream::BoxStream;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub use config::{BackendKind, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use key::{DocumentKey, PLAYER_PREFIX};
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
pub use query::{Comparison, Predicate, PredicateQuery};

pub type Document = serde_json::Value;

/// One-shot stream of query results. Re-running a query means calling
/// [`DocumentStore::query`] again.
pub type DocumentStream = BoxStream<'static, StoreResult<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyPresent,
}

pub enum Backend {
    Postgres(PostgresBackend),
    Memory(MemoryBackend),
}

/// Opened collection. Cheap to clone; all clones share one cache entry.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    collection: String,
    indexed: AtomicBool,
}

impl Handle {
    fn new(collection: &str) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                collection: collection.to_string(),
                indexed: AtomicBool::new(false),
            }),
        }
    }

    pub fn collection(&self) -> &str {
        &self.inner.collection
    }

    /// True when both handles come from the same cache entry.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("collection", &self.inner.collection)
            .finish()
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Backend,
    handles: Mutex<HashMap<String, Arc<OnceCell<Handle>>>>,
}

impl DocumentStore {
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                handles: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Backend::Memory(MemoryBackend::new()))
    }

    /// Connect to the configured backend. Failing here is fatal for the
    /// caller; the adapter does not retry.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let backend = match config.backend {
            BackendKind::Postgres => Backend::Postgres(PostgresBackend::connect(config).await?),
            BackendKind::Memory => Backend::Memory(MemoryBackend::new()),
        };
        tracing::info!(
            backend = ?config.backend,
            host = %config.host,
            "Connected to document store"
        );
        Ok(Self::new(backend))
    }

    /// Returns the cached handle for `collection`, creating the collection on
    /// first use. Concurrent first opens of one name share a single setup.
    pub async fn open(&self, collection: &str) -> StoreResult<Handle> {
        validate_collection_name(collection)?;

        let cell = {
            let mut handles = self.inner.handles.lock();
            handles.entry(collection.to_string()).or_default().clone()
        };

        let handle = cell
            .get_or_try_init(|| async {
                match &self.inner.backend {
                    Backend::Postgres(pg) => pg.open_collection(collection).await?,
                    Backend::Memory(mem) => mem.open_collection(collection)?,
                }
                tracing::debug!(collection, "Opened collection");
                Ok::<_, StoreError>(Handle::new(collection))
            })
            .await?;

        Ok(handle.clone())
    }

    /// Number of collections with a live cached handle.
    pub fn open_handles(&self) -> usize {
        self.inner
            .handles
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn ensure_index(&self, handle: &Handle) -> StoreResult<IndexStatus> {
        if handle.inner.indexed.load(Ordering::Acquire) {
            return Ok(IndexStatus::AlreadyPresent);
        }

        let status = match &self.inner.backend {
            Backend::Postgres(pg) => pg.ensure_index(handle.collection()).await?,
            Backend::Memory(mem) => mem.ensure_index(handle.collection())?,
        };
        handle.inner.indexed.store(true, Ordering::Release);

        if status == IndexStatus::Created {
            tracing::info!(collection = handle.collection(), "Created collection index");
        }
        Ok(status)
    }

    pub async fn put(&self, handle: &Handle, key: &DocumentKey, doc: Document) -> StoreResult<()> {
        if !doc.is_object() {
            return Err(StoreError::write(format!(
                "document for `{key}` must be a JSON object"
            )));
        }
        match &self.inner.backend {
            Backend::Postgres(pg) => pg.upsert(handle.collection(), key.as_str(), doc).await,
            Backend::Memory(mem) => mem.upsert(handle.collection(), key.as_str(), doc),
        }
    }

    pub async fn put_json<T: Serialize>(
        &self,
        handle: &Handle,
        key: &DocumentKey,
        value: &T,
    ) -> StoreResult<()> {
        let doc = serde_json::to_value(value).map_err(StoreError::write)?;
        self.put(handle, key, doc).await
    }

    pub async fn get(&self, handle: &Handle, key: &DocumentKey) -> StoreResult<Document> {
        match &self.inner.backend {
            Backend::Postgres(pg) => pg.get(handle.collection(), key.as_str()).await,
            Backend::Memory(mem) => mem.get(handle.collection(), key.as_str()),
        }
    }

    pub async fn remove(&self, handle: &Handle, key: &DocumentKey) -> StoreResult<bool> {
        match &self.inner.backend {
            Backend::Postgres(pg) => pg.remove(handle.collection(), key.as_str()).await,
            Backend::Memory(mem) => mem.remove(handle.collection(), key.as_str()),
        }
    }

    pub fn query(&self, handle: &Handle, query: PredicateQuery) -> StoreResult<DocumentStream> {
        query.validate()?;
        tracing::debug!(collection = handle.collection(), ?query, "Querying collection");
        match &self.inner.backend {
            Backend::Postgres(pg) => Ok(pg.query(handle.collection(), query)),
            Backend::Memory(mem) => mem.query(handle.collection(), &query),
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        match &self.inner.backend {
            Backend::Postgres(pg) => pg.ping().await,
            Backend::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Backend::Postgres(pg) = &self.inner.backend {
            pg.close().await;
        }
    }
}

fn validate_collection_name(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= 48 {
        Ok(())
    } else {
        Err(StoreError::collection(
            name,
            "names must be identifiers of at most 48 characters",
        ))
    }
}
