//! Backend port for schema introspection.
//!
//! This module defines the interface the cache uses to ask a live backend
//! ground-truth questions about its schema, plus the value types those
//! answers are expressed in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SchemaBackend                            │
//! │  - data_source_exists(name)   - columns_of(name)                │
//! │  - data_sources()             - indexes_of(name)                │
//! │  - primary_key_of(name)       - schema_version()                │
//! │                               - database_version()              │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            live database / catalog (not this crate)             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method is a pure read against the backend: answering a query has
//! no side effects, so repeating a query is wasteful but always safe. The
//! cache relies on that when concurrent misses race.
//!
//! `InMemoryBackend` is a fixture implementation used by the test suite and
//! by callers that want to exercise cache behavior without a database.

mod error;
mod memory;
mod port;
mod types;

pub use error::{BackendError, BackendResult};
pub use memory::{CallCounts, Counter, DataSourceDef, InMemoryBackend};
pub use port::SchemaBackend;
pub use types::{
    ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey, SchemaVersion,
};
