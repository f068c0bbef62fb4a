//! Property-based test generators using proptest.

use groupdb_codec::{IdOrName, Path, PathElement, Value};
use proptest::prelude::*;

/// Strategy for generating entity kinds.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Za-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating ids and printable ASCII names.
pub fn id_or_name_strategy() -> impl Strategy<Value = IdOrName> {
    prop_oneof![
        any::<u64>().prop_map(IdOrName::Id),
        prop::string::string_regex("[ -~]{0,16}")
            .expect("Invalid regex")
            .prop_map(IdOrName::Name),
    ]
}

/// Strategy for generating non-root paths of up to `max_depth` elements.
pub fn path_strategy(max_depth: usize) -> impl Strategy<Value = Path> {
    prop::collection::vec(
        (kind_strategy(), id_or_name_strategy()).prop_map(|(kind, id)| PathElement::new(kind, id)),
        1..=max_depth.max(1),
    )
    .prop_map(Path::from_elements)
}

/// Strategy for generating indexable values. Doubles are never NaN.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        any::<bool>().prop_map(Value::Bool),
        "\\PC{0,24}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        any::<f64>()
            .prop_filter("NaN has no index order", |d| !d.is_nan())
            .prop_map(Value::Double),
        path_strategy(3).prop_map(Value::Key),
    ]
}

/// Strategy for generating sorted, distinct index names.
pub fn sorted_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..=max.max(1))
        .prop_map(|names| names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupdb_codec::{decode_path, encode_path, encode_value};
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_paths_encode() {
        let mut runner = TestRunner::default();
        runner
            .run(&path_strategy(4), |path| {
                prop_assert!(!path.is_root());
                prop_assert_eq!(decode_path(&encode_path(&path).unwrap()).unwrap(), path);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn generated_values_encode() {
        let mut runner = TestRunner::default();
        runner
            .run(&value_strategy(), |value| {
                prop_assert!(encode_value(&value).is_ok());
                Ok(())
            })
            .unwrap();
    }
}
