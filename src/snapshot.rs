//! Versioned snapshot encoding of a schema cache.
//!
//! A `Snapshot` captures every cache table in plain owned values so the whole
//! cache can be persisted and reloaded into a fresh process without touching
//! the backend. Two encodings share one field set:
//!
//! - **Positional record**: a stable seven-element JSON array
//!   `[version, columns, <reserved>, primary_keys, data_sources, indexes,
//!   database_version]`. The reserved slot is the legacy columns-by-name
//!   field; it is written as an empty object and discarded on decode so the
//!   arity never changes for older readers.
//! - **Named document**: the same seven fields as a JSON object, for
//!   interchange with configuration/checkpoint systems. Unknown fields are
//!   ignored on decode; missing optional fields take their defaults.
//!
//! Columns-by-name is never transmitted in either form. It is re-derived
//! from the restored columns table, then every restored value goes back
//! through the `Interner`, so a loaded cache has the same sharing guarantees
//! as one built incrementally.
//!
//! Tables are `BTreeMap`s so equal caches always encode to identical bytes,
//! which also makes `digest()` a meaningful change detector.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::backend::{
    ColumnDescriptor, DatabaseVersion, IndexDescriptor, PrimaryKey, SchemaVersion,
};

/// Result type for snapshot encoding and decoding.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while encoding or decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The record has the wrong shape, arity, or field type.
    ///
    /// Decoding aborts before any cache table is installed, so a corrupt
    /// snapshot never leaves a partially-constructed cache behind.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    /// Serialization failed while encoding.
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the snapshot file failed.
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),
}

/// Serialized form of a whole schema cache.
///
/// Field names here are the named-document field names; `columns_by_name`
/// is intentionally absent (re-derived on restore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version freshly read from the backend at dump time.
    pub version: SchemaVersion,
    /// Columns per data source.
    pub columns: BTreeMap<String, Vec<ColumnDescriptor>>,
    /// Primary key per data source; `None` means "cached as having none".
    pub primary_keys: BTreeMap<String, Option<PrimaryKey>>,
    /// Existence flags per data source.
    #[serde(default)]
    pub data_sources: BTreeMap<String, bool>,
    /// Indexes per data source.
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<IndexDescriptor>>,
    /// Engine version at dump time.
    #[serde(default)]
    pub database_version: Option<DatabaseVersion>,
}

impl Snapshot {
    /// Encode as the positional seven-field record.
    pub fn to_positional_bytes(&self) -> SnapshotResult<Vec<u8>> {
        let record = Value::Array(vec![
            serde_json::to_value(self.version)?,
            serde_json::to_value(&self.columns)?,
            // Reserved legacy columns-by-name slot, kept so the field count
            // and order stay stable for older readers.
            Value::Object(Map::new()),
            serde_json::to_value(&self.primary_keys)?,
            serde_json::to_value(&self.data_sources)?,
            serde_json::to_value(&self.indexes)?,
            serde_json::to_value(&self.database_version)?,
        ]);
        Ok(serde_json::to_vec(&record)?)
    }

    /// Decode the positional record.
    ///
    /// `version`, `columns` and `primary_keys` are required; a missing
    /// trailing existence table or index table decodes as empty and a
    /// missing database version as unset, matching dumps written before
    /// those fields existed.
    pub fn from_positional_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        let record: Value = serde_json::from_slice(bytes)
            .map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        let fields = match record {
            Value::Array(fields) => fields,
            other => {
                return Err(SnapshotError::Corrupt(format!(
                    "expected a positional record, found {}",
                    type_name(&other)
                )))
            }
        };

        let version = required_field(&fields, 0, "version")?;
        let columns = required_field(&fields, 1, "columns")?;
        // fields[2] is the reserved columns-by-name slot; always discarded.
        let primary_keys = required_field(&fields, 3, "primary_keys")?;
        let data_sources = optional_field(&fields, 4, "data_sources")?.unwrap_or_default();
        let indexes = optional_field(&fields, 5, "indexes")?.unwrap_or_default();
        let database_version = optional_field(&fields, 6, "database_version")?;

        Ok(Self {
            version,
            columns,
            primary_keys,
            data_sources,
            indexes,
            database_version,
        })
    }

    /// Encode as the named JSON document.
    ///
    /// Writes the same seven fields as the positional record, including the
    /// reserved `columns_by_name` slot as an empty object.
    pub fn to_document_bytes(&self) -> SnapshotResult<Vec<u8>> {
        let mut doc = Map::new();
        doc.insert("version".into(), serde_json::to_value(self.version)?);
        doc.insert("columns".into(), serde_json::to_value(&self.columns)?);
        doc.insert("columns_by_name".into(), Value::Object(Map::new()));
        doc.insert(
            "primary_keys".into(),
            serde_json::to_value(&self.primary_keys)?,
        );
        doc.insert(
            "data_sources".into(),
            serde_json::to_value(&self.data_sources)?,
        );
        doc.insert("indexes".into(), serde_json::to_value(&self.indexes)?);
        doc.insert(
            "database_version".into(),
            serde_json::to_value(&self.database_version)?,
        );
        Ok(serde_json::to_vec_pretty(&Value::Object(doc))?)
    }

    /// Decode the named JSON document.
    ///
    /// Unknown fields (including the reserved `columns_by_name` slot) are
    /// ignored, so documents written by newer versions still load.
    pub fn from_document_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SnapshotError::Corrupt(e.to_string()))
    }

    /// Write the snapshot to a file.
    ///
    /// A `.json` extension selects the named document; anything else writes
    /// the positional record. Parent directories are created as needed.
    pub fn write_to(&self, path: impl AsRef<Path>) -> SnapshotResult<()> {
        let path = path.as_ref();
        let bytes = if is_document_path(path) {
            self.to_document_bytes()?
        } else {
            self.to_positional_bytes()?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a snapshot from a file, dispatching on extension like `write_to`.
    pub fn read_from(path: impl AsRef<Path>) -> SnapshotResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if is_document_path(path) {
            Self::from_document_bytes(&bytes)
        } else {
            Self::from_positional_bytes(&bytes)
        }
    }

    /// SHA256 hex digest of the named encoding.
    ///
    /// Stable across processes because every table is ordered; useful for
    /// cheap "has the schema changed" checks without byte comparison.
    pub fn digest(&self) -> SnapshotResult<String> {
        let bytes = self.to_document_bytes()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn is_document_path(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required_field<T: DeserializeOwned>(
    fields: &[Value],
    position: usize,
    name: &str,
) -> SnapshotResult<T> {
    let value = fields.get(position).ok_or_else(|| {
        SnapshotError::Corrupt(format!(
            "missing required field `{name}` at position {position}"
        ))
    })?;
    serde_json::from_value(value.clone())
        .map_err(|e| SnapshotError::Corrupt(format!("field `{name}`: {e}")))
}

fn optional_field<T: DeserializeOwned>(
    fields: &[Value],
    position: usize,
    name: &str,
) -> SnapshotResult<Option<T>> {
    match fields.get(position) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| SnapshotError::Corrupt(format!("field `{name}`: {e}"))),
    }
}
