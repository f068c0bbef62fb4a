//! Building index rows for entities.

use crate::error::{IndexError, IndexResult};
use bytes::Bytes;
use groupdb_codec::key::{entity_row_key, key_prefix};
use groupdb_codec::{encode_path, encode_value, Path, Value, KEY_DELIMITER};
use groupdb_store::INDEX_REFERENCE_COLUMN;

/// One row of the ascending property index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// Index key.
    pub key: Vec<u8>,
    /// Row key of the entity the entry points at.
    pub reference: Vec<u8>,
}

impl IndexRow {
    /// Column names and values to store for this row.
    pub fn cells(&self) -> (Vec<&'static str>, Vec<Bytes>) {
        (
            vec![INDEX_REFERENCE_COLUMN],
            vec![Bytes::copy_from_slice(&self.reference)],
        )
    }
}

/// Returns the key prefix shared by every entry with `property == value`
/// for `kind`.
///
/// The prefix ends with the delimiter, so it is never a prefix of an entry
/// for a different value.
pub fn index_prefix(
    project_id: &str,
    namespace: &str,
    kind: &str,
    property: &str,
    value: &Value,
) -> IndexResult<Vec<u8>> {
    if project_id.is_empty() || kind.is_empty() || property.is_empty() {
        return Err(IndexError::bad_request(
            "project, kind and property must be non-empty",
        ));
    }
    let mut prefix = key_prefix(&[
        ("project_id", project_id.as_bytes()),
        ("namespace", namespace.as_bytes()),
        ("kind", kind.as_bytes()),
        ("property", property.as_bytes()),
    ])?;
    prefix.extend_from_slice(&encode_value(value)?);
    prefix.push(KEY_DELIMITER);
    Ok(prefix)
}

/// Returns the index key of the entry for `path` under `property == value`.
///
/// The kind is the kind of the last path element.
pub fn index_entry_key(
    project_id: &str,
    namespace: &str,
    path: &Path,
    property: &str,
    value: &Value,
) -> IndexResult<Vec<u8>> {
    let kind = path
        .elements()
        .last()
        .map(|element| element.kind.as_str())
        .ok_or_else(|| IndexError::bad_request("cannot index the root path"))?;
    let mut key = index_prefix(project_id, namespace, kind, property, value)?;
    key.extend_from_slice(&encode_path(path)?);
    Ok(key)
}

/// Builds one index row per `(property, value)` of the entity at `path`.
pub fn index_rows_for(
    project_id: &str,
    namespace: &str,
    path: &Path,
    properties: &[(&str, Value)],
) -> IndexResult<Vec<IndexRow>> {
    let reference = entity_row_key(project_id, namespace, path)?;
    properties
        .iter()
        .map(|(property, value)| {
            Ok(IndexRow {
                key: index_entry_key(project_id, namespace, path, property, value)?,
                reference: reference.clone(),
            })
        })
        .collect()
}
