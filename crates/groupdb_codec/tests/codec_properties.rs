//! Property tests for the order-preserving encodings.

use groupdb_codec::key::{entity_row_key, path_of_row_key, root_key_of};
use groupdb_codec::{decode_path, encode_path, encode_value, IdOrName, Path, PathElement, Value};
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,8}"
}

fn arb_id_or_name() -> impl Strategy<Value = IdOrName> {
    prop_oneof![
        any::<u64>().prop_map(IdOrName::Id),
        "[ -~]{0,12}".prop_map(IdOrName::Name),
    ]
}

fn arb_path() -> impl Strategy<Value = Path> {
    prop::collection::vec(
        (arb_kind(), arb_id_or_name()).prop_map(|(kind, id)| PathElement::new(kind, id)),
        1..5,
    )
    .prop_map(Path::from_elements)
}

proptest! {
    #[test]
    fn path_roundtrip(path in arb_path()) {
        let bytes = encode_path(&path).unwrap();
        prop_assert_eq!(decode_path(&bytes).unwrap(), path);
    }

    #[test]
    fn path_encoding_preserves_order(a in arb_path(), b in arb_path()) {
        let (ea, eb) = (encode_path(&a).unwrap(), encode_path(&b).unwrap());
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
    }

    #[test]
    fn root_key_matches_entity_group(path in arb_path()) {
        let key = entity_row_key("app", "ns", &path).unwrap();
        let group = entity_row_key("app", "ns", &path.entity_group()).unwrap();
        prop_assert_eq!(root_key_of(&key).unwrap(), group);
        prop_assert_eq!(path_of_row_key(&key).unwrap(), path);
    }

    #[test]
    fn integer_encoding_preserves_order(a in any::<i64>(), b in any::<i64>()) {
        let ea = encode_value(&Value::Integer(a)).unwrap();
        let eb = encode_value(&Value::Integer(b)).unwrap();
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
    }

    #[test]
    fn double_encoding_preserves_order(
        a in any::<f64>().prop_filter("not NaN", |v| !v.is_nan()),
        b in any::<f64>().prop_filter("not NaN", |v| !v.is_nan()),
    ) {
        let ea = encode_value(&Value::Double(a)).unwrap();
        let eb = encode_value(&Value::Double(b)).unwrap();
        prop_assert_eq!(ea.cmp(&eb), a.total_cmp(&b));
    }

    #[test]
    fn text_encoding_preserves_order(a in "\\PC{0,16}", b in "\\PC{0,16}") {
        let ea = encode_value(&Value::Text(a.clone())).unwrap();
        let eb = encode_value(&Value::Text(b.clone())).unwrap();
        prop_assert_eq!(ea.cmp(&eb), a.as_bytes().cmp(b.as_bytes()));
    }

    #[test]
    fn bytes_encoding_preserves_order(
        a in prop::collection::vec(any::<u8>(), 0..16),
        b in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let ea = encode_value(&Value::Bytes(a.clone())).unwrap();
        let eb = encode_value(&Value::Bytes(b.clone())).unwrap();
        prop_assert!(!ea.contains(&0));
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
    }
}

#[test]
fn path_serializes_through_serde() {
    let path = Path::new().child("Guestbook", "main").child("Greeting", 7u64);
    let json = serde_json::to_string(&path).unwrap();
    let back: Path = serde_json::from_str(&json).unwrap();
    assert_eq!(back, path);
}
