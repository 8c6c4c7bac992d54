//! # schema-cache
//!
//! A lazy, deduplicating cache for structural database metadata, with a
//! stable versioned snapshot format.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        caller                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │ read / invalidate
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     SchemaCache                          │
//! │   existence │ columns │ columns-by-name │ pk │ indexes   │
//! └─────────────────────────────────────────────────────────┘
//!          │ miss                          ▲
//!          ▼                               │ canonical Arc
//! ┌──────────────────────┐      ┌──────────────────────────┐
//! │    SchemaBackend     │─────▶│        Interner          │
//! │  (introspection I/O) │      │  (structural dedup)      │
//! └──────────────────────┘      └──────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Snapshot                           │
//! │   positional record  ⇄  SchemaCache  ⇄  named document  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache answers five kinds of question per data source (does it exist,
//! its columns, its columns keyed by name, its primary key, its indexes),
//! resolving each lazily against the backend on first miss and from memory
//! afterwards. Snapshots capture the whole cache for reload into a fresh
//! process without re-querying the backend.

pub mod backend;
pub mod cache;
pub mod dedup;
pub mod snapshot;

pub use backend::{
    BackendError, BackendResult, ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey,
    SchemaBackend, SchemaVersion,
};
pub use cache::{ColumnsByName, SchemaCache};
pub use snapshot::{Snapshot, SnapshotError, SnapshotResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::backend::{
        BackendError, BackendResult, ColumnDescriptor, DatabaseVersion, IndexDescriptor,
        PrimaryKey, SchemaBackend, SchemaVersion,
    };
    pub use crate::cache::{ColumnsByName, SchemaCache};
    pub use crate::dedup::Interner;
    pub use crate::snapshot::{Snapshot, SnapshotError, SnapshotResult};
}
