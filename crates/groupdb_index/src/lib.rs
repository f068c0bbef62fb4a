//! # GroupDB Index
//!
//! Secondary-index scans for query evaluation.
//!
//! Index entries live in the ascending property index table, one row per
//! `(kind, property, value, entity path)`. All entries of one
//! `(kind, property, value)` share a prefix and sort by path, so an equality
//! filter is a prefix scan. A merge-join driver intersects several
//! [`RangeIterator`]s by advancing the most constrained one and moving the
//! others forward with [`RangeIterator::set_cursor`] and
//! [`RangeIterator::restrict_to_path`].
//!
//! [`index_rows_for`] builds the rows a writer stores next to an entity.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod filter;
mod iterator;
mod writer;

pub use config::{IndexConfig, DEFAULT_CHUNK_SIZE};
pub use error::{IndexError, IndexResult};
pub use filter::{Condition, FilterOp, PropertyFilter, KEY_PROPERTY};
pub use iterator::{Cursor, IndexEntry, KeyRange, RangeIterator};
pub use writer::{index_entry_key, index_prefix, index_rows_for, IndexRow};
