//! # GroupDB Store
//!
//! Key/value tables over a wide-column store.
//!
//! The crate has two seams:
//! - [`ColumnStore`] - the raw store: sparse rows of bytes, inclusive scans
//! - [`TableStore`] - what the rest of GroupDB calls: entity reads and
//!   writes, key-range queries with exclusive bounds, limit and offset, and
//!   schema bookkeeping
//!
//! [`ColumnTableStore`] implements the second on top of the first and
//! routes every call through a [`groupdb_retry::RetryPolicy`].
//! [`InMemoryColumnStore`] is the bundled column store.
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use groupdb_retry::CallContext;
//! use groupdb_store::{ColumnTableStore, InMemoryColumnStore, RangeQuery, StoreConfig, TableStore};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let ctx = CallContext::new();
//! let store = ColumnTableStore::connect(
//!     Arc::new(InMemoryColumnStore::new()),
//!     StoreConfig::default(),
//!     &ctx,
//! )
//! .await
//! .unwrap();
//!
//! for key in ["a", "b", "c"] {
//!     store
//!         .put_entity(&ctx, "letters", key.as_bytes(), &["v"], vec![Bytes::from(key)])
//!         .await
//!         .unwrap();
//! }
//!
//! let query = RangeQuery::new("letters", "a", "c").with_inclusive(false, true).keys_only();
//! let rows = store.range_query(&ctx, &query).await.unwrap();
//! assert_eq!(rows.len(), 2);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod column;
mod column_table;
mod config;
mod error;
mod memory;
mod schema;
mod table;

pub use column::{ColumnStore, RangeRow};
pub use column_table::ColumnTableStore;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryColumnStore;
pub use schema::{
    decode_schema, encode_schema, is_system_table, INDEX_REFERENCE_COLUMN, INDEX_TABLE,
    SCHEMA_COLUMN, SCHEMA_TABLE,
};
pub use table::{RangeQuery, TableStore};
