//! Row-key and index-key layout.
//!
//! An entity row key is `app_id ⎵ namespace ⎵ encode_path(path)` where `⎵`
//! is [`KEY_DELIMITER`]. Its root key (the entity-group lock key) keeps only
//! the first path element.

use crate::error::{CodecError, CodecResult};
use crate::path::{decode_path, encode_path, Path};

/// Separates fields of a composite key.
pub const KEY_DELIMITER: u8 = 0x00;

/// Terminates every encoded path element.
pub const PATH_SEPARATOR: u8 = 0x01;

/// Appended to a prefix to form the exclusive end of the prefix's range.
pub const TERMINATOR: u8 = 0xFF;

/// Rejects key fields that contain the delimiter.
pub fn check_field(field: &'static str, value: &[u8]) -> CodecResult<()> {
    if value.contains(&KEY_DELIMITER) {
        return Err(CodecError::ReservedByte {
            field,
            byte: KEY_DELIMITER,
        });
    }
    Ok(())
}

/// Joins fields with the delimiter and appends a trailing delimiter, so
/// that no prefix built from one field list is a prefix of another.
pub fn key_prefix(fields: &[(&'static str, &[u8])]) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    for (name, value) in fields {
        check_field(name, value)?;
        out.extend_from_slice(value);
        out.push(KEY_DELIMITER);
    }
    Ok(out)
}

/// Exclusive upper bound of every key starting with `prefix`.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(prefix.len() + 1);
    end.extend_from_slice(prefix);
    end.push(TERMINATOR);
    end
}

/// Builds the entity row key for `path`.
pub fn entity_row_key(app_id: &str, namespace: &str, path: &Path) -> CodecResult<Vec<u8>> {
    if app_id.is_empty() {
        return Err(CodecError::encoding_failed("empty app id"));
    }
    if path.is_root() {
        return Err(CodecError::invalid_path("entity key needs at least one element"));
    }
    let mut key = key_prefix(&[
        ("app_id", app_id.as_bytes()),
        ("namespace", namespace.as_bytes()),
    ])?;
    key.extend_from_slice(&encode_path(path)?);
    Ok(key)
}

/// Splits an entity row key into `(app_id, namespace, encoded path)`.
fn split_row_key(row_key: &[u8]) -> CodecResult<(&[u8], &[u8], &[u8])> {
    let mut parts = row_key.splitn(3, |b| *b == KEY_DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(app), Some(namespace), Some(path)) if !app.is_empty() && !path.is_empty() => {
            Ok((app, namespace, path))
        }
        _ => Err(CodecError::decoding_failed("malformed entity row key")),
    }
}

/// Returns the application id a row key belongs to.
pub fn app_id_of(row_key: &[u8]) -> CodecResult<&str> {
    let (app, _, _) = split_row_key(row_key)?;
    std::str::from_utf8(app).map_err(|_| CodecError::InvalidUtf8)
}

/// Returns the entity-group root key of a row key: everything up to and
/// including the first path element.
pub fn root_key_of(row_key: &[u8]) -> CodecResult<Vec<u8>> {
    let (app, namespace, path) = split_row_key(row_key)?;
    let first_end = path
        .iter()
        .position(|b| *b == PATH_SEPARATOR)
        .ok_or_else(|| CodecError::decoding_failed("row key has no complete path element"))?;
    let header = app.len() + namespace.len() + 2;
    Ok(row_key[..header + first_end + 1].to_vec())
}

/// Decodes the path stored in an entity row key.
pub fn path_of_row_key(row_key: &[u8]) -> CodecResult<Path> {
    let (_, _, path) = split_row_key(row_key)?;
    decode_path(path)
}
