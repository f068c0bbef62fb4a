//! Reserved tables and the schema record format.

use groupdb_codec::CodecError;

/// Table holding one schema record per user table.
pub const SCHEMA_TABLE: &str = "__schema__";

/// Column of [`SCHEMA_TABLE`] holding the column list.
pub const SCHEMA_COLUMN: &str = "schema";

/// Table holding ascending single-property index entries.
pub const INDEX_TABLE: &str = "__index_asc__";

/// Column of [`INDEX_TABLE`] holding the referenced entity row key.
pub const INDEX_REFERENCE_COLUMN: &str = "reference";

const SCHEMA_SEPARATOR: char = ':';

/// Serializes an ordered column list.
pub fn encode_schema(columns: &[&str]) -> String {
    columns.join(&SCHEMA_SEPARATOR.to_string())
}

/// Parses a stored column list.
pub fn decode_schema(bytes: &[u8]) -> Result<Vec<String>, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(text.split(SCHEMA_SEPARATOR).map(str::to_string).collect())
}

/// Returns true for tables whose names are reserved by the store itself.
pub fn is_system_table(table: &str) -> bool {
    table == SCHEMA_TABLE || table == INDEX_TABLE
}
