//! Range query semantics over the in-memory column store.

use bytes::Bytes;
use groupdb_retry::CallContext;
use groupdb_store::{ColumnTableStore, InMemoryColumnStore, RangeQuery, StoreConfig, TableStore};
use std::sync::Arc;

async fn letters() -> ColumnTableStore<InMemoryColumnStore> {
    let store = ColumnTableStore::new(Arc::new(InMemoryColumnStore::new()), StoreConfig::no_retry());
    let ctx = CallContext::new();
    for key in ["a", "b", "c", "d", "e", "f"] {
        store
            .put_entity(
                &ctx,
                "letters",
                key.as_bytes(),
                &["upper"],
                vec![Bytes::from(key.to_uppercase())],
            )
            .await
            .unwrap();
    }
    store
}

fn keys(rows: &[groupdb_store::RangeRow]) -> Vec<String> {
    rows.iter()
        .map(|row| String::from_utf8(row.key.clone()).unwrap())
        .collect()
}

#[tokio::test]
async fn inclusive_bounds() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "b", "e").with_columns(["upper"]);
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["b", "c", "d", "e"]);
    assert_eq!(rows[0].value(0), Some(&Bytes::from("B")));
}

#[tokio::test]
async fn exclusive_end() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "b", "e").with_inclusive(true, false);
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["b", "c", "d"]);
}

#[tokio::test]
async fn exclusive_start_with_limit() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "b", "e")
        .with_inclusive(false, false)
        .with_limit(2);
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["c", "d"]);
}

#[tokio::test]
async fn exclusive_bounds_on_missing_keys() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "bb", "dd")
        .with_inclusive(false, false)
        .with_limit(1);
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["c"]);
}

#[tokio::test]
async fn offset_applies_after_limit() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "a", "f").with_limit(4).with_offset(1);
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["b", "c", "d"]);
}

#[tokio::test]
async fn keys_only_returns_no_values() {
    let store = letters().await;
    let ctx = CallContext::new();
    let query = RangeQuery::new("letters", "a", "c")
        .with_columns(["upper"])
        .keys_only();
    let rows = store.range_query(&ctx, &query).await.unwrap();
    assert_eq!(keys(&rows), ["a", "b", "c"]);
    assert!(rows.iter().all(|row| row.values.is_empty()));
}

#[tokio::test]
async fn empty_and_unknown_ranges() {
    let store = letters().await;
    let ctx = CallContext::new();
    let same_key = RangeQuery::new("letters", "c", "c").with_inclusive(false, true);
    assert!(store.range_query(&ctx, &same_key).await.unwrap().is_empty());

    let unknown = RangeQuery::new("nothing", "a", "z");
    assert!(store.range_query(&ctx, &unknown).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_table_lists_every_row() {
    let store = letters().await;
    let ctx = CallContext::new();
    let rows = store.get_table(&ctx, "letters", &["upper"]).await.unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[5].value(0), Some(&Bytes::from("F")));
}
