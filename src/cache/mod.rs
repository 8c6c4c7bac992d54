//! Lazy, per-data-source schema metadata cache.
//!
//! Introspection queries are expensive (round-trips, catalog scans) and
//! structural metadata changes rarely, so every answer is memoized the first
//! time it is resolved and served from memory afterwards.
//!
//! # Design
//!
//! - Five tables keyed by data-source name: existence, columns,
//!   columns-by-name, primary key, indexes
//! - Entries are created on first read miss and destroyed only by explicit
//!   invalidation
//! - Every inserted name and descriptor is routed through the `Interner`,
//!   so structurally-equal values share one `Arc`
//! - Backend failures propagate verbatim and are never cached
//!
//! # Data flow
//!
//! ```text
//! caller ──▶ SchemaCache ──[hit]──▶ cached Arc
//!                │
//!              [miss]
//!                ▼
//!          SchemaBackend ──▶ Interner ──▶ stored ──▶ returned
//! ```
//!
//! Columns-by-name is always derived from the columns table (on demand for
//! incremental use, wholesale after a snapshot restore), never maintained
//! independently, so the two can never disagree.
//!
//! # Concurrency
//!
//! Methods take `&mut self`; there is no interior locking. Cached values are
//! immutable `Arc`s and safe to read from any number of threads once handed
//! out. Callers that want shared mutable access or single-flight population
//! wrap the cache in their own synchronization.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::backend::{
    BackendError, BackendResult, ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey,
    SchemaBackend, SchemaVersion,
};
use crate::dedup::Interner;
use crate::snapshot::Snapshot;

/// Columns of one data source indexed by column name.
pub type ColumnsByName = HashMap<Arc<str>, Arc<ColumnDescriptor>>;

/// Memoizing schema metadata cache bound to one backend.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use schema_cache::{SchemaBackend, SchemaCache};
///
/// async fn example(backend: Arc<dyn SchemaBackend>) -> schema_cache::BackendResult<()> {
///     let mut cache = SchemaCache::new(backend);
///     let columns = cache.columns("orders").await?;   // backend query
///     let again = cache.columns("orders").await?;     // served from memory
///     assert_eq!(columns, again);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SchemaCache {
    backend: Arc<dyn SchemaBackend>,
    interner: Interner,
    columns: HashMap<Arc<str>, Vec<Arc<ColumnDescriptor>>>,
    columns_by_name: HashMap<Arc<str>, ColumnsByName>,
    primary_keys: HashMap<Arc<str>, Option<PrimaryKey>>,
    data_sources: HashMap<Arc<str>, bool>,
    indexes: HashMap<Arc<str>, Vec<Arc<IndexDescriptor>>>,
    version: Option<SchemaVersion>,
    database_version: Option<DatabaseVersion>,
    /// Whether the existence table has been bulk-seeded from the backend's
    /// data-source listing. At most one bulk listing per cache lifetime;
    /// reset only by `invalidate_all`.
    primed: bool,
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("columns", &self.columns.len())
            .field("columns_by_name", &self.columns_by_name.len())
            .field("primary_keys", &self.primary_keys.len())
            .field("data_sources", &self.data_sources.len())
            .field("indexes", &self.indexes.len())
            .field("version", &self.version)
            .field("database_version", &self.database_version)
            .field("primed", &self.primed)
            .finish()
    }
}

impl SchemaCache {
    /// Create an empty cache bound to `backend`.
    pub fn new(backend: Arc<dyn SchemaBackend>) -> Self {
        Self {
            backend,
            interner: Interner::new(),
            columns: HashMap::new(),
            columns_by_name: HashMap::new(),
            primary_keys: HashMap::new(),
            data_sources: HashMap::new(),
            indexes: HashMap::new(),
            version: None,
            database_version: None,
            primed: false,
        }
    }

    /// The backend this cache resolves misses against.
    pub fn backend(&self) -> &Arc<dyn SchemaBackend> {
        &self.backend
    }

    /// Whether `name` exists in the backend, as of last check.
    ///
    /// The first unanswered call seeds the existence table with the
    /// backend's full data-source listing; a name still absent after the
    /// seed gets one direct probe whose result is cached either way. Unknown
    /// names answer `false`, they never error.
    pub async fn exists(&mut self, name: &str) -> BackendResult<bool> {
        if let Some(flag) = self.data_sources.get(name) {
            return Ok(*flag);
        }
        if !self.primed {
            self.prime().await?;
            if let Some(flag) = self.data_sources.get(name) {
                return Ok(*flag);
            }
        }
        let found = self.backend.data_source_exists(name).await?;
        let key = self.interner.intern_str(name);
        self.data_sources.insert(key, found);
        Ok(found)
    }

    /// Bulk-seed the existence table, marking every listed name `true`.
    async fn prime(&mut self) -> BackendResult<()> {
        let names = self.backend.data_sources().await?;
        for name in names {
            let key = self.interner.intern_str(&name);
            self.data_sources.insert(key, true);
        }
        // Only a successful listing counts as primed; a failed one is
        // retried on the next miss.
        self.primed = true;
        Ok(())
    }

    /// Primary key of `name`, `None` when the source is missing or keyless.
    ///
    /// A cached "does not exist" answers `None` without a backend call and
    /// without creating a primary-key entry.
    pub async fn primary_key(&mut self, name: &str) -> BackendResult<Option<PrimaryKey>> {
        if let Some(pk) = self.primary_keys.get(name) {
            return Ok(pk.clone());
        }
        if !self.exists(name).await? {
            return Ok(None);
        }
        let pk = self.backend.primary_key_of(name).await?;
        let key = self.interner.intern_str(name);
        self.primary_keys.insert(key, pk.clone());
        Ok(pk)
    }

    /// Columns of `name`, in declaration order.
    ///
    /// No existence check: the caller is trusted to hold a valid name, and a
    /// backend error for an unknown one propagates as a backend failure.
    pub async fn columns(&mut self, name: &str) -> BackendResult<Vec<Arc<ColumnDescriptor>>> {
        if let Some(cols) = self.columns.get(name) {
            return Ok(cols.clone());
        }
        let fetched = self.backend.columns_of(name).await?;
        let cols = self.interner.intern_columns(fetched);
        let key = self.interner.intern_str(name);
        self.columns.insert(key, cols.clone());
        Ok(cols)
    }

    /// Columns of `name` indexed by column name.
    ///
    /// Derived from `columns(name)` on first use, then cached.
    pub async fn columns_by_name(&mut self, name: &str) -> BackendResult<ColumnsByName> {
        if let Some(map) = self.columns_by_name.get(name) {
            return Ok(map.clone());
        }
        let cols = self.columns(name).await?;
        let map = self.index_by_name(&cols);
        let key = self.interner.intern_str(name);
        self.columns_by_name.insert(key, map.clone());
        Ok(map)
    }

    /// Indexes of `name`. Same lazy pattern as `columns`.
    pub async fn indexes(&mut self, name: &str) -> BackendResult<Vec<Arc<IndexDescriptor>>> {
        if let Some(idx) = self.indexes.get(name) {
            return Ok(idx.clone());
        }
        let fetched = self.backend.indexes_of(name).await?;
        let idx = self.interner.intern_indexes(fetched);
        let key = self.interner.intern_str(name);
        self.indexes.insert(key, idx.clone());
        Ok(idx)
    }

    /// Whether a columns-by-name entry is cached for `name`.
    ///
    /// Pure presence check, no population side effect.
    pub fn has_columns_by_name(&self, name: &str) -> bool {
        self.columns_by_name.contains_key(name)
    }

    /// Eagerly cache primary key, columns, columns-by-name and indexes for
    /// `name`. No-op when the source does not exist.
    pub async fn populate(&mut self, name: &str) -> BackendResult<()> {
        if !self.exists(name).await? {
            return Ok(());
        }
        self.primary_key(name).await?;
        self.columns(name).await?;
        self.columns_by_name(name).await?;
        self.indexes(name).await?;
        Ok(())
    }

    /// Populate many names at once, fetching from the backend in parallel.
    ///
    /// Names that do not exist or already have cached columns are skipped.
    /// Backend queries are pure reads, so concurrent fetches for distinct
    /// names cannot interfere.
    pub async fn populate_many(&mut self, names: &[&str]) -> BackendResult<()> {
        let mut pending = Vec::new();
        for name in names {
            if self.exists(name).await? && !self.columns.contains_key(*name) {
                pending.push((*name).to_string());
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let backend = Arc::clone(&self.backend);
        let fetches = pending.iter().map(|name| {
            let backend = Arc::clone(&backend);
            async move {
                let pk = backend.primary_key_of(name).await?;
                let cols = backend.columns_of(name).await?;
                let idx = backend.indexes_of(name).await?;
                Ok::<_, BackendError>((name.clone(), pk, cols, idx))
            }
        });
        let fetched = try_join_all(fetches).await?;

        for (name, pk, cols, idx) in fetched {
            let key = self.interner.intern_str(&name);
            let cols = self.interner.intern_columns(cols);
            let by_name = self.index_by_name(&cols);
            let idx = self.interner.intern_indexes(idx);
            self.primary_keys.insert(Arc::clone(&key), pk);
            self.columns_by_name.insert(Arc::clone(&key), by_name);
            self.indexes.insert(Arc::clone(&key), idx);
            self.columns.insert(key, cols);
        }
        Ok(())
    }

    /// Engine version descriptor, computed once per cache lifetime.
    ///
    /// Survives per-name invalidation; only `invalidate_all` resets it.
    pub async fn database_version(&mut self) -> BackendResult<DatabaseVersion> {
        if let Some(version) = &self.database_version {
            return Ok(version.clone());
        }
        let version = self.backend.database_version().await?;
        self.database_version = Some(version.clone());
        Ok(version)
    }

    /// Last schema version observed by a dump or restore.
    pub fn version(&self) -> Option<SchemaVersion> {
        self.version
    }

    /// Remove every cached entry kind for `name`, leaving other names alone.
    pub fn invalidate(&mut self, name: &str) {
        self.columns.remove(name);
        self.columns_by_name.remove(name);
        self.primary_keys.remove(name);
        self.data_sources.remove(name);
        self.indexes.remove(name);
    }

    /// Clear every table and unset the schema and database versions.
    pub fn invalidate_all(&mut self) {
        self.columns.clear();
        self.columns_by_name.clear();
        self.primary_keys.clear();
        self.data_sources.clear();
        self.indexes.clear();
        self.interner = Interner::new();
        self.version = None;
        self.database_version = None;
        self.primed = false;
    }

    /// Diagnostic entry count: columns + columns-by-name + primary-key +
    /// existence entries. Indexes are excluded, matching the wire layout's
    /// original accounting.
    pub fn size(&self) -> usize {
        self.columns.len()
            + self.columns_by_name.len()
            + self.primary_keys.len()
            + self.data_sources.len()
    }

    /// Capture the whole cache as a snapshot.
    ///
    /// The schema version is read fresh from the backend every time; a stale
    /// cached version is never good enough for a snapshot. The database
    /// version is computed now if no call has forced it yet.
    pub async fn dump(&mut self) -> BackendResult<Snapshot> {
        let version = self.backend.schema_version().await?;
        self.version = Some(version);
        let database_version = self.database_version().await?;

        Ok(Snapshot {
            version,
            columns: self
                .columns
                .iter()
                .map(|(name, cols)| {
                    (
                        name.to_string(),
                        cols.iter().map(|c| (**c).clone()).collect(),
                    )
                })
                .collect(),
            primary_keys: self
                .primary_keys
                .iter()
                .map(|(name, pk)| (name.to_string(), pk.clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, flag)| (name.to_string(), *flag))
                .collect(),
            indexes: self
                .indexes
                .iter()
                .map(|(name, idx)| {
                    (
                        name.to_string(),
                        idx.iter().map(|i| (**i).clone()).collect(),
                    )
                })
                .collect(),
            database_version: Some(database_version),
        })
    }

    /// Reconstruct a cache from a snapshot without touching the backend.
    ///
    /// Columns-by-name is re-derived from the restored columns table, and
    /// every restored key and value is re-interned so the loaded cache has
    /// the same sharing guarantees as one built incrementally. The returned
    /// value is complete or not returned at all.
    pub fn restore(snapshot: Snapshot, backend: Arc<dyn SchemaBackend>) -> Self {
        let Snapshot {
            version,
            columns,
            primary_keys,
            data_sources,
            indexes,
            database_version,
        } = snapshot;

        let mut cache = SchemaCache::new(backend);

        for (name, cols) in columns {
            let key = cache.interner.intern_str(&name);
            let cols = cache.interner.intern_columns(cols);
            let by_name = cache.index_by_name(&cols);
            cache.columns_by_name.insert(Arc::clone(&key), by_name);
            cache.columns.insert(key, cols);
        }
        for (name, pk) in primary_keys {
            let key = cache.interner.intern_str(&name);
            cache.primary_keys.insert(key, pk);
        }
        for (name, flag) in data_sources {
            let key = cache.interner.intern_str(&name);
            cache.data_sources.insert(key, flag);
        }
        for (name, idx) in indexes {
            let key = cache.interner.intern_str(&name);
            let idx = cache.interner.intern_indexes(idx);
            cache.indexes.insert(key, idx);
        }

        cache.version = Some(version);
        cache.database_version = database_version;
        // A restored existence table stands in for the bulk seed; an empty
        // one (older dump) leaves the seed to the first `exists` miss.
        cache.primed = !cache.data_sources.is_empty();
        cache
    }

    fn index_by_name(&mut self, cols: &[Arc<ColumnDescriptor>]) -> ColumnsByName {
        cols.iter()
            .map(|col| (self.interner.intern_str(&col.name), Arc::clone(col)))
            .collect()
    }
}
