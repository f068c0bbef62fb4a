//! # GroupDB Testkit
//!
//! Test utilities for GroupDB.
//!
//! This crate provides:
//! - Column stores that record, delay or fail calls
//! - A coordination service that injects failures
//! - Fixtures for stores, coordinators and entity writes
//! - Property-based test generators using proptest
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust
//! use groupdb_testkit::prelude::*;
//! use std::time::Duration;
//!
//! let recording = Arc::new(RecordingColumnStore::new(
//!     Arc::new(InMemoryColumnStore::new()),
//!     Duration::from_millis(1),
//! ));
//! let store = table_store_over(Arc::clone(&recording));
//! assert!(recording.calls().is_empty());
//! # drop(store);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod coordination;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod stores;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coordination::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::stores::*;
    pub use groupdb_store::InMemoryColumnStore;
    pub use std::sync::Arc;
}

pub use coordination::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use stores::*;
