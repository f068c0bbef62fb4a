//! Which tables are written without entity-group locks.

use groupdb_store::{INDEX_TABLE, SCHEMA_TABLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Suffix of journal tables.
pub const JOURNAL_SUFFIX: &str = "__journal";

/// Marker that makes any table non-transactional.
pub const NON_TRANSACTIONAL_MARKER: &str = "__nontx__";

/// Decides which tables bypass the lock protocol.
///
/// A table bypasses locking when it is on the allow-list (the system tables
/// plus any configured extras), ends with the journal suffix, or contains
/// the non-transactional marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPolicy {
    /// Tables that are always written without a lock.
    pub bypass_tables: BTreeSet<String>,
    /// Tables ending with this suffix bypass locking.
    pub journal_suffix: String,
    /// Tables containing this marker bypass locking.
    pub non_transactional_marker: String,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            bypass_tables: [SCHEMA_TABLE, INDEX_TABLE]
                .into_iter()
                .map(str::to_string)
                .collect(),
            journal_suffix: JOURNAL_SUFFIX.to_string(),
            non_transactional_marker: NON_TRANSACTIONAL_MARKER.to_string(),
        }
    }
}

impl LockPolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the allow-list.
    #[must_use]
    pub fn with_bypass_table(mut self, table: impl Into<String>) -> Self {
        self.bypass_tables.insert(table.into());
        self
    }

    /// Returns true if writes to `table` must hold the entity-group lock.
    pub fn is_transactional(&self, table: &str) -> bool {
        !(self.bypass_tables.contains(table)
            || table.ends_with(&self.journal_suffix)
            || table.contains(&self.non_transactional_marker))
    }
}
