//! In-memory SchemaBackend fixture.
//!
//! Holds a fixed set of data source definitions and counts every query it
//! answers, so tests can assert exactly how many introspection calls a cache
//! operation issued.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::error::{BackendError, BackendResult};
use super::port::SchemaBackend;
use super::types::{
    ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey, SchemaVersion,
};

/// Full definition of one fixture data source.
#[derive(Debug, Clone, Default)]
pub struct DataSourceDef {
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Option<PrimaryKey>,
    pub indexes: Vec<IndexDescriptor>,
}

impl DataSourceDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, pk: PrimaryKey) -> Self {
        self.primary_key = Some(pk);
        self
    }

    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }
}

/// Monotonic call counter, readable while the backend is shared.
#[derive(Debug, Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// One counter per `SchemaBackend` method.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub data_source_exists: Counter,
    pub data_sources: Counter,
    pub primary_key_of: Counter,
    pub columns_of: Counter,
    pub indexes_of: Counter,
    pub schema_version: Counter,
    pub database_version: Counter,
}

/// SchemaBackend backed by an in-process map of definitions.
///
/// # Example
///
/// ```ignore
/// let backend = InMemoryBackend::new()
///     .with_data_source(
///         "users",
///         DataSourceDef::new()
///             .column(ColumnDescriptor::new("id", "bigint").not_null().identity())
///             .primary_key(PrimaryKey::single("id")),
///     )
///     .with_schema_version(20260801120000);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    sources: BTreeMap<String, DataSourceDef>,
    version: AtomicI64,
    database_version: DatabaseVersion,
    pub calls: CallCounts,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a data source definition.
    pub fn with_data_source(mut self, name: impl Into<String>, def: DataSourceDef) -> Self {
        self.sources.insert(name.into(), def);
        self
    }

    pub fn with_schema_version(self, version: i64) -> Self {
        self.version.store(version, Ordering::SeqCst);
        self
    }

    pub fn with_database_version(
        mut self,
        product_name: impl Into<String>,
        product_version: impl Into<String>,
    ) -> Self {
        self.database_version = DatabaseVersion::new(product_name, product_version);
        self
    }

    /// Bump the reported schema version, as a migration would.
    ///
    /// Takes `&self` so tests can advance the version after the backend has
    /// been shared behind an `Arc`.
    pub fn set_schema_version(&self, version: i64) {
        self.version.store(version, Ordering::SeqCst);
    }

    fn lookup(&self, name: &str) -> BackendResult<&DataSourceDef> {
        self.sources.get(name).ok_or_else(|| {
            BackendError::remote(
                "undefined_data_source",
                format!("data source \"{name}\" does not exist"),
            )
        })
    }
}

#[async_trait]
impl SchemaBackend for InMemoryBackend {
    async fn data_source_exists(&self, name: &str) -> BackendResult<bool> {
        self.calls.data_source_exists.hit();
        Ok(self.sources.contains_key(name))
    }

    async fn data_sources(&self) -> BackendResult<BTreeSet<String>> {
        self.calls.data_sources.hit();
        Ok(self.sources.keys().cloned().collect())
    }

    async fn primary_key_of(&self, name: &str) -> BackendResult<Option<PrimaryKey>> {
        self.calls.primary_key_of.hit();
        Ok(self.lookup(name)?.primary_key.clone())
    }

    async fn columns_of(&self, name: &str) -> BackendResult<Vec<ColumnDescriptor>> {
        self.calls.columns_of.hit();
        Ok(self.lookup(name)?.columns.clone())
    }

    async fn indexes_of(&self, name: &str) -> BackendResult<Vec<IndexDescriptor>> {
        self.calls.indexes_of.hit();
        Ok(self.lookup(name)?.indexes.clone())
    }

    async fn schema_version(&self) -> BackendResult<SchemaVersion> {
        self.calls.schema_version.hit();
        Ok(SchemaVersion(self.version.load(Ordering::SeqCst)))
    }

    async fn database_version(&self) -> BackendResult<DatabaseVersion> {
        self.calls.database_version.hit();
        Ok(self.database_version.clone())
    }
}
