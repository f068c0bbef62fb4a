//! # GroupDB Codec
//!
//! Order-preserving encodings for GroupDB keys.
//!
//! Every encoding in this crate is built so that the bytewise order of the
//! output matches the native order of the input:
//! - [`encode_value`] for indexed property values
//! - [`encode_path`] / [`decode_path`] for entity ancestor paths
//! - [`key`] helpers for entity row keys, root keys and index prefixes
//!
//! ## Key Layout
//!
//! - Fields are joined by [`KEY_DELIMITER`] (`0x00`)
//! - Each path element ends with [`PATH_SEPARATOR`] (`0x01`)
//! - A prefix followed by [`TERMINATOR`] (`0xFF`) sorts after every key
//!   that extends the prefix with a valid suffix
//!
//! ## Usage
//!
//! ```
//! use groupdb_codec::{decode_path, encode_path, Path};
//!
//! let path = Path::new().child("Guestbook", "main").child("Greeting", 42u64);
//! let bytes = encode_path(&path).unwrap();
//! assert_eq!(decode_path(&bytes).unwrap(), path);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod key;
mod path;
mod value;

pub use error::{CodecError, CodecResult};
pub use key::{KEY_DELIMITER, PATH_SEPARATOR, TERMINATOR};
pub use path::{decode_path, encode_path, IdOrName, Path, PathElement};
pub use value::{encode_value, Value};
