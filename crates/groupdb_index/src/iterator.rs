//! Cursor-based scanner over one index prefix.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::filter::PropertyFilter;
use crate::writer::index_prefix;
use groupdb_codec::key::prefix_end;
use groupdb_codec::{decode_path, encode_path, CodecError, Path};
use groupdb_retry::CallContext;
use groupdb_store::{RangeQuery, RangeRow, TableStore, INDEX_REFERENCE_COLUMN, INDEX_TABLE};
use std::sync::Arc;
use tracing::debug;

/// Position of an iterator inside its range.
///
/// An inclusive cursor may next return the entry at `key`; an exclusive one
/// only entries after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Index key the cursor sits on.
    pub key: Vec<u8>,
    /// Whether an entry at `key` is still to be returned.
    pub inclusive: bool,
}

/// Half-open key range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// First key of the range.
    pub start: Vec<u8>,
    /// Exclusive end of the range.
    pub end: Vec<u8>,
}

impl KeyRange {
    fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && key < self.end.as_slice()
    }
}

/// One decoded index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Full index key.
    pub key: Vec<u8>,
    /// Path of the indexed entity.
    pub path: Path,
    /// Row key of the indexed entity.
    pub entity_key: Vec<u8>,
}

/// Scans the index entries of one `(kind, property, value)` triple in path
/// order.
///
/// The iterator keeps a monotonic cursor and a range that can only shrink.
/// A merge-join driver advances one iterator with [`Self::next_entry`] and
/// moves the others forward with [`Self::set_cursor`] and
/// [`Self::restrict_to_path`]. Every mutator validates before it changes
/// anything, so a rejected call leaves the iterator as it was.
///
/// Once a fetch returns fewer rows than the chunk size, the store side is
/// known to be exhausted and the remaining entries come from the cache.
pub struct RangeIterator<T: TableStore + ?Sized> {
    store: Arc<T>,
    config: IndexConfig,
    prefix: Vec<u8>,
    range: KeyRange,
    cursor: Cursor,
    cache: Vec<IndexEntry>,
    store_exhausted: bool,
}

impl<T: TableStore + ?Sized> std::fmt::Debug for RangeIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeIterator")
            .field("prefix", &self.prefix)
            .field("range", &self.range)
            .field("cursor", &self.cursor)
            .field("cached", &self.cache.len())
            .field("store_exhausted", &self.store_exhausted)
            .finish()
    }
}

impl<T: TableStore + ?Sized> RangeIterator<T> {
    /// Creates an iterator over the entries matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BadRequest`] unless `filter` is a single
    /// equality on a property other than `__key__`, and a codec error if
    /// the prefix cannot be encoded.
    pub fn from_filter(
        store: Arc<T>,
        project_id: &str,
        namespace: &str,
        kind: &str,
        filter: &PropertyFilter,
        config: IndexConfig,
    ) -> IndexResult<Self> {
        let condition = filter.as_single_equality().ok_or_else(|| {
            IndexError::bad_request("range iterator needs a single equality filter")
        })?;
        let prefix = index_prefix(project_id, namespace, kind, &condition.property, &condition.value)?;
        let range = KeyRange {
            start: prefix.clone(),
            end: prefix_end(&prefix),
        };
        let cursor = Cursor {
            key: prefix.clone(),
            inclusive: true,
        };
        Ok(Self {
            store,
            config,
            prefix,
            range,
            cursor,
            cache: Vec::new(),
            store_exhausted: false,
        })
    }

    /// Key prefix shared by every entry of this iterator.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Current range.
    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    /// Current cursor.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Returns true once no entry can be returned without a store fetch
    /// and the store side is known to be drained.
    pub fn is_exhausted(&self) -> bool {
        self.store_exhausted && self.cached_position().is_none()
    }

    /// Returns the next entry in path order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::RangeExhausted`] at the end of the range and
    /// store errors that outlived the store's retry policy.
    pub async fn next_entry(&mut self, ctx: &CallContext) -> IndexResult<IndexEntry> {
        if let Some(entry) = self.take_cached() {
            return Ok(entry);
        }
        if self.store_exhausted {
            return Err(IndexError::RangeExhausted);
        }
        self.fetch_chunk(ctx).await?;
        self.take_cached().ok_or(IndexError::RangeExhausted)
    }

    /// Returns the path the cursor sits on, or the root path while the
    /// cursor is still at the prefix.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the cursor key does not hold a valid path.
    pub fn get_cursor(&self) -> IndexResult<Path> {
        let suffix = self
            .cursor
            .key
            .get(self.prefix.len()..)
            .ok_or_else(|| CodecError::decoding_failed("cursor shorter than prefix"))?;
        Ok(decode_path(suffix)?)
    }

    /// Moves the cursor forward to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BadRequest`], without moving the cursor, if the
    /// new position is behind the current one, would re-include the entry
    /// an exclusive cursor already passed, or lies outside the range.
    pub fn set_cursor(&mut self, path: &Path, inclusive: bool) -> IndexResult<()> {
        let key = self.key_for(path)?;
        if key < self.cursor.key {
            return Err(IndexError::bad_request(format!(
                "cursor cannot move backwards to {path}"
            )));
        }
        if key == self.cursor.key && inclusive && !self.cursor.inclusive {
            return Err(IndexError::bad_request(format!(
                "cursor already moved past {path}"
            )));
        }
        if !self.range.contains(&key) {
            return Err(IndexError::bad_request(format!(
                "cursor {path} is outside the iterator range"
            )));
        }
        self.cursor = Cursor { key, inclusive };
        Ok(())
    }

    /// Narrows the range to `path` and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BadRequest`], without changing anything, if the
    /// new span is not inside the current range or the cursor has already
    /// passed it.
    pub fn restrict_to_path(&mut self, path: &Path) -> IndexResult<()> {
        let start = self.key_for(path)?;
        let end = prefix_end(&start);
        if start < self.range.start || end > self.range.end {
            return Err(IndexError::bad_request(format!(
                "restricting to {path} would widen the range"
            )));
        }
        if self.cursor.key >= end {
            return Err(IndexError::bad_request(format!(
                "cursor is already past {path}"
            )));
        }

        if self.cursor.key < start {
            self.cursor = Cursor {
                key: start.clone(),
                inclusive: true,
            };
        }
        self.range = KeyRange { start, end };
        Ok(())
    }

    fn key_for(&self, path: &Path) -> IndexResult<Vec<u8>> {
        let mut key = self.prefix.clone();
        key.extend_from_slice(&encode_path(path)?);
        Ok(key)
    }

    /// Index of the first cached entry after the cursor and inside the range.
    fn cached_position(&self) -> Option<usize> {
        let mut index = self
            .cache
            .partition_point(|entry| entry.key < self.cursor.key);
        if !self.cursor.inclusive
            && self
                .cache
                .get(index)
                .is_some_and(|entry| entry.key == self.cursor.key)
        {
            index += 1;
        }
        self.cache
            .get(index)
            .filter(|entry| entry.key < self.range.end)
            .map(|_| index)
    }

    fn take_cached(&mut self) -> Option<IndexEntry> {
        let entry = self.cache.get(self.cached_position()?)?.clone();
        self.cursor = Cursor {
            key: entry.key.clone(),
            inclusive: false,
        };
        Some(entry)
    }

    async fn fetch_chunk(&mut self, ctx: &CallContext) -> IndexResult<()> {
        let chunk_size = self.config.chunk_size;
        let query = RangeQuery::new(INDEX_TABLE, self.cursor.key.clone(), self.range.end.clone())
            .with_columns([INDEX_REFERENCE_COLUMN])
            .with_limit(chunk_size)
            .with_inclusive(self.cursor.inclusive, false);
        let rows = self.store.range_query(ctx, &query).await?;

        debug!(
            fetched = rows.len(),
            chunk_size,
            inclusive = self.cursor.inclusive,
            "fetched index chunk"
        );
        if rows.len() < chunk_size {
            self.store_exhausted = true;
        }
        if rows.is_empty() {
            self.cache.clear();
            return Err(IndexError::RangeExhausted);
        }

        self.cache = rows
            .into_iter()
            .map(|row| self.decode_entry(row))
            .collect::<IndexResult<_>>()?;
        Ok(())
    }

    fn decode_entry(&self, row: RangeRow) -> IndexResult<IndexEntry> {
        let suffix = row
            .key
            .get(self.prefix.len()..)
            .filter(|_| row.key.starts_with(&self.prefix))
            .ok_or_else(|| CodecError::decoding_failed("index entry outside its prefix"))?;
        let path = decode_path(suffix)?;
        let entity_key = row
            .value(0)
            .map(|reference| reference.to_vec())
            .ok_or_else(|| CodecError::decoding_failed("index entry has no reference"))?;
        Ok(IndexEntry {
            key: row.key,
            path,
            entity_key,
        })
    }
}
