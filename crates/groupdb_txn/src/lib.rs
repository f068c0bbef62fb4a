//! # GroupDB Transactions
//!
//! Entity-group locking for entity writes.
//!
//! Every entity belongs to the group named by the first element of its
//! path. A write to a transactional table:
//!
//! 1. allocates a [`TransactionId`] from the [`CoordinationService`]
//! 2. acquires the lock on the group's root key, retrying while it is held
//! 3. reads the target row and writes the entity and its index rows
//! 4. releases the lock, also when the write failed or was dropped
//!
//! Tables exempted by the [`LockPolicy`] (system tables, journals and
//! tables carrying the non-transactional marker) skip steps 1, 2 and 4.
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use groupdb_codec::{key::entity_row_key, Path};
//! use groupdb_retry::CallContext;
//! use groupdb_store::{ColumnTableStore, InMemoryColumnStore, StoreConfig};
//! use groupdb_txn::{
//!     CoordinatorConfig, EntityGroupCoordinator, EntityWrite, InMemoryCoordinationService,
//!     WriteOutcome,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = Arc::new(ColumnTableStore::new(
//!     Arc::new(InMemoryColumnStore::new()),
//!     StoreConfig::default(),
//! ));
//! let service = Arc::new(InMemoryCoordinationService::new());
//! let coordinator = EntityGroupCoordinator::new(store, service, CoordinatorConfig::default());
//!
//! let path = Path::new().child("Guestbook", "main").child("Greeting", 1u64);
//! let write = EntityWrite::new("greetings", entity_row_key("app", "", &path).unwrap())
//!     .with_column("text", Bytes::from_static(b"hello"));
//!
//! let report = coordinator.put_entity(&CallContext::new(), write).await.unwrap();
//! assert_eq!(report.outcome, WriteOutcome::Written);
//! assert!(report.transaction_id().is_some());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod guard;
mod memory;
mod policy;
mod service;
mod types;

pub use config::CoordinatorConfig;
pub use coordinator::EntityGroupCoordinator;
pub use error::{TxnError, TxnResult};
pub use memory::{InMemoryCoordinationService, LockRelease};
pub use policy::{LockPolicy, JOURNAL_SUFFIX, NON_TRANSACTIONAL_MARKER};
pub use service::CoordinationService;
pub use types::{EntityWrite, TransactionId, WriteOutcome, WriteReport};
