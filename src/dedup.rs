//! Structural deduplication of cached metadata values.
//!
//! Schema metadata repeats itself: every table has an `id bigint NOT NULL`
//! column, the same type names appear thousands of times, and snapshot loads
//! re-create values the cache already holds. The `Interner` keeps one
//! canonical `Arc` per structurally-equal value so repeated entries share
//! storage instead of growing the heap.
//!
//! Canonicalization is a pure memory optimization: it never changes the
//! equality or ordering of a value, never mutates its input (values are
//! consumed and rebuilt), and is idempotent: interning an already-canonical
//! value hands back the same `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::{ColumnDescriptor, IndexDescriptor};

/// Canonical pools for the value shapes the cache stores.
///
/// Lookup goes through `HashSet::get` with the borrowed form, so probing for
/// an existing canonical instance allocates nothing.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    strings: HashSet<Arc<str>>,
    columns: HashSet<Arc<ColumnDescriptor>>,
    indexes: HashSet<Arc<IndexDescriptor>>,
}

/// Pool sizes, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternerStats {
    pub strings: usize,
    pub columns: usize,
    pub indexes: usize,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical shared instance equal to `value`.
    pub fn intern_str(&mut self, value: &str) -> Arc<str> {
        if let Some(canonical) = self.strings.get(value) {
            return Arc::clone(canonical);
        }
        let canonical: Arc<str> = Arc::from(value);
        self.strings.insert(Arc::clone(&canonical));
        canonical
    }

    /// Canonical shared instance equal to `column`.
    pub fn intern_column(&mut self, column: ColumnDescriptor) -> Arc<ColumnDescriptor> {
        if let Some(canonical) = self.columns.get(&column) {
            return Arc::clone(canonical);
        }
        let canonical = Arc::new(column);
        self.columns.insert(Arc::clone(&canonical));
        canonical
    }

    /// Canonicalize a whole column list, element by element.
    pub fn intern_columns(
        &mut self,
        columns: Vec<ColumnDescriptor>,
    ) -> Vec<Arc<ColumnDescriptor>> {
        columns.into_iter().map(|c| self.intern_column(c)).collect()
    }

    /// Canonical shared instance equal to `index`.
    pub fn intern_index(&mut self, index: IndexDescriptor) -> Arc<IndexDescriptor> {
        if let Some(canonical) = self.indexes.get(&index) {
            return Arc::clone(canonical);
        }
        let canonical = Arc::new(index);
        self.indexes.insert(Arc::clone(&canonical));
        canonical
    }

    /// Canonicalize a whole index list, element by element.
    pub fn intern_indexes(&mut self, indexes: Vec<IndexDescriptor>) -> Vec<Arc<IndexDescriptor>> {
        indexes.into_iter().map(|i| self.intern_index(i)).collect()
    }

    pub fn stats(&self) -> InternerStats {
        InternerStats {
            strings: self.strings.len(),
            columns: self.columns.len(),
            indexes: self.indexes.len(),
        }
    }
}
