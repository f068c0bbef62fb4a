//! # GroupDB Retry
//!
//! Retry with jittered exponential (or quadratic) backoff, and the call
//! context that carries a deadline and a cancellation token through every
//! GroupDB component.
//!
//! This crate provides:
//! - [`RetryPolicy`] - backoff configuration and the async retry loop
//! - [`Retryable`] - the allow-list of error kinds worth retrying
//! - [`CallContext`] - deadline + cancellation for one logical request
//! - [`Interrupted`] - why a call was abandoned before it finished
//!
//! ## Example
//!
//! ```rust
//! use groupdb_retry::{CallContext, Interrupted, RetryPolicy, Retryable};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Unreachable,
//!     Interrupted(Interrupted),
//! }
//!
//! impl std::fmt::Display for FetchError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl From<Interrupted> for FetchError {
//!     fn from(value: Interrupted) -> Self {
//!         Self::Interrupted(value)
//!     }
//! }
//!
//! impl Retryable for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, FetchError::Unreachable)
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let policy = RetryPolicy::new(3).with_backoff_threshold(Duration::from_millis(5));
//! let ctx = CallContext::new();
//! let mut calls = 0;
//! let value = policy
//!     .run_retryable(&ctx, "fetch", || {
//!         calls += 1;
//!         let attempt = calls;
//!         async move {
//!             if attempt < 3 {
//!                 Err(FetchError::Unreachable)
//!             } else {
//!                 Ok(attempt)
//!             }
//!         }
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 3);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod policy;
mod runner;

pub use context::{CallContext, Interrupted};
pub use policy::{Backoff, RetryPolicy, JITTER_HIGH, JITTER_LOW};
pub use runner::Retryable;
