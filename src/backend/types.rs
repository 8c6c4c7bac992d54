//! Value types returned by backend introspection.
//!
//! All of these are immutable once constructed. The cache shares them freely
//! behind `Arc`s, so none of them expose interior mutability.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic token for the latest applied migration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SchemaVersion(pub i64);

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One column of a data source, as the backend describes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Backend-specific declared type.
    pub data_type: String,
    /// Whether NULL values are allowed.
    pub is_nullable: bool,
    /// Default value expression.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Maximum length for string types.
    #[serde(default)]
    pub max_length: Option<i32>,
    /// Whether this is an identity/auto-increment column.
    #[serde(default)]
    pub is_identity: bool,
}

impl ColumnDescriptor {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_value: None,
            max_length: None,
            is_identity: false,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Mark the column as identity/auto-increment.
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }
}

/// One index of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// Columns in the index (ordered).
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub is_unique: bool,
    /// Index type (BTREE, HASH, etc.).
    #[serde(default)]
    pub index_type: Option<String>,
}

impl IndexDescriptor {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        is_unique: bool,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            is_unique,
            index_type: None,
        }
    }
}

/// A table's primary key: one column or an ordered composite.
///
/// "No primary key at all" is represented by `Option<PrimaryKey>` at the
/// call sites, so a cached `None` is a fact distinct from "never asked".
///
/// Serialized untagged: a single key is a bare string, a composite key an
/// array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    pub fn composite(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Composite(columns.into_iter().map(Into::into).collect())
    }
}

/// Version descriptor of the connected engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseVersion {
    /// Database product name.
    pub product_name: String,
    /// Database version string.
    pub product_version: String,
}

impl DatabaseVersion {
    pub fn new(product_name: impl Into<String>, product_version: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            product_version: product_version.into(),
        }
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product_name, self.product_version)
    }
}
