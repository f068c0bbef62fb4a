//! Indexed property values and their order-preserving encoding.

use crate::error::{CodecError, CodecResult};
use crate::path::{encode_path, Path};
use std::cmp::Ordering;

const TAG_NULL: u8 = 0x10;
const TAG_INTEGER: u8 = 0x20;
const TAG_BOOL: u8 = 0x30;
const TAG_TEXT: u8 = 0x40;
const TAG_BYTES: u8 = 0x50;
const TAG_DOUBLE: u8 = 0x60;
const TAG_KEY: u8 = 0x70;

const ESCAPE: u8 = 0x01;
const SIGN_FLIP_MASK: u64 = 1u64 << 63;

/// A property value that can appear in a secondary index.
///
/// Values of different types order by type, in declaration order: null,
/// integer, bool, text, bytes, double, key. Within a type the order is the
/// natural one; doubles use the IEEE total order (so `-0.0 < 0.0`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Boolean value.
    Bool(bool),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Double-precision float. NaN cannot be encoded.
    Double(f64),
    /// Reference to another entity.
    Key(Path),
}

impl Value {
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => TAG_NULL,
            Value::Integer(_) => TAG_INTEGER,
            Value::Bool(_) => TAG_BOOL,
            Value::Text(_) => TAG_TEXT,
            Value::Bytes(_) => TAG_BYTES,
            Value::Double(_) => TAG_DOUBLE,
            Value::Key(_) => TAG_KEY,
        }
    }

    /// Compares two values in index order.
    pub fn cmp_index_order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Key(a), Value::Key(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Value::Key(v)
    }
}

/// Encodes a value so that byte order matches [`Value::cmp_index_order`].
///
/// The output never contains [`crate::KEY_DELIMITER`], so it can sit inside
/// a delimited index key.
///
/// # Errors
///
/// Fails on NaN doubles and on key values whose path cannot be encoded.
pub fn encode_value(value: &Value) -> CodecResult<Vec<u8>> {
    let mut out = vec![value.type_rank()];
    match value {
        Value::Null => {}
        Value::Integer(v) => push_hex(&mut out, (*v as u64) ^ SIGN_FLIP_MASK),
        Value::Bool(v) => out.push(if *v { b'1' } else { b'0' }),
        Value::Text(v) => push_escaped(&mut out, v.as_bytes()),
        Value::Bytes(v) => push_escaped(&mut out, v),
        Value::Double(v) => {
            if v.is_nan() {
                return Err(CodecError::NaNForbidden);
            }
            push_hex(&mut out, ordered_f64_bits(*v));
        }
        Value::Key(path) => out.extend_from_slice(&encode_path(path)?),
    }
    Ok(out)
}

/// Maps a double onto a `u64` whose unsigned order is the IEEE total order.
fn ordered_f64_bits(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits & SIGN_FLIP_MASK != 0 {
        !bits
    } else {
        bits ^ SIGN_FLIP_MASK
    }
}

/// Fixed-width lowercase hex keeps numeric order and avoids reserved bytes.
fn push_hex(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(format!("{v:016x}").as_bytes());
}

/// `0x00 -> 01 01`, `0x01 -> 01 02`; every other byte is copied.
fn push_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        match b {
            0x00 => out.extend_from_slice(&[ESCAPE, 0x01]),
            0x01 => out.extend_from_slice(&[ESCAPE, 0x02]),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KEY_DELIMITER;

    fn enc(v: Value) -> Vec<u8> {
        encode_value(&v).unwrap()
    }

    #[test]
    fn integers_order_across_sign() {
        let samples = [i64::MIN, -1_000_000, -1, 0, 1, 42, i64::MAX];
        for pair in samples.windows(2) {
            assert!(enc(Value::Integer(pair[0])) < enc(Value::Integer(pair[1])));
        }
    }

    #[test]
    fn doubles_order_across_sign() {
        let samples = [f64::NEG_INFINITY, -2.5, -0.0, 0.0, 1e-300, 3.25, f64::INFINITY];
        for pair in samples.windows(2) {
            assert!(enc(Value::Double(pair[0])) < enc(Value::Double(pair[1])));
        }
    }

    #[test]
    fn nan_rejected() {
        assert_eq!(
            encode_value(&Value::Double(f64::NAN)),
            Err(CodecError::NaNForbidden)
        );
    }

    #[test]
    fn text_prefix_sorts_first() {
        assert!(enc("a".into()) < enc("a\u{0}".into()));
        assert!(enc("a\u{0}".into()) < enc("a\u{1}".into()));
        assert!(enc("a\u{1}".into()) < enc("a\u{2}".into()));
        assert!(enc("ab".into()) < enc("b".into()));
    }

    #[test]
    fn encodings_never_contain_delimiter() {
        let values = [
            Value::Null,
            Value::Integer(0),
            Value::Integer(i64::MIN),
            Value::Text("nul\u{0}inside".into()),
            Value::Bytes(vec![0, 0, 1, 255]),
            Value::Double(0.0),
            Value::Key(Path::new().child("K", 0u64)),
        ];
        for v in values {
            assert!(!enc(v.clone()).contains(&KEY_DELIMITER), "{v:?}");
        }
    }

    #[test]
    fn type_order_is_stable() {
        let ordered = [
            Value::Null,
            Value::Integer(i64::MAX),
            Value::Bool(false),
            Value::Text(String::new()),
            Value::Bytes(Vec::new()),
            Value::Double(f64::NEG_INFINITY),
            Value::Key(Path::new()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].cmp_index_order(&pair[1]), Ordering::Less);
            assert!(enc(pair[0].clone()) < enc(pair[1].clone()));
        }
    }

    #[test]
    fn bools_order() {
        assert!(enc(false.into()) < enc(true.into()));
    }
}
