//! SchemaBackend trait definition.
//!
//! The SchemaBackend trait abstracts over whatever actually answers
//! structural-introspection queries: a live connection, a worker process,
//! or an in-memory fixture.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::error::BackendResult;
use super::types::{
    ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey, SchemaVersion,
};

/// Answers ground-truth schema questions for the cache.
///
/// All methods are pure reads with no backend side effects. Calls may block
/// on network or catalog I/O; no timeout is imposed at this level, callers
/// inherit whatever cancellation contract the implementation has.
///
/// # Example
///
/// ```ignore
/// use schema_cache::backend::SchemaBackend;
///
/// async fn example(backend: &impl SchemaBackend) -> schema_cache::BackendResult<()> {
///     if backend.data_source_exists("orders").await? {
///         let columns = backend.columns_of("orders").await?;
///         let pk = backend.primary_key_of("orders").await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Check whether a single data source exists.
    async fn data_source_exists(&self, name: &str) -> BackendResult<bool>;

    /// List the names of all known data sources.
    ///
    /// Used as the bulk seed for the cache's existence table.
    async fn data_sources(&self) -> BackendResult<BTreeSet<String>>;

    /// Primary key of a data source, `None` when it has no primary key.
    async fn primary_key_of(&self, name: &str) -> BackendResult<Option<PrimaryKey>>;

    /// Columns of a data source, in declaration order.
    ///
    /// Asking for an unknown name is a backend failure, not a `None`; the
    /// caller is expected to have checked existence where that matters.
    async fn columns_of(&self, name: &str) -> BackendResult<Vec<ColumnDescriptor>>;

    /// Indexes of a data source.
    async fn indexes_of(&self, name: &str) -> BackendResult<Vec<IndexDescriptor>>;

    /// The latest applied migration version.
    async fn schema_version(&self) -> BackendResult<SchemaVersion>;

    /// Version descriptor of the connected engine.
    async fn database_version(&self) -> BackendResult<DatabaseVersion>;
}
