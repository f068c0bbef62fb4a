//! Concurrent writers to tagged pull-queue tables.

use bytes::Bytes;
use groupdb_retry::CallContext;
use groupdb_store::TableStore;
use groupdb_testkit::prelude::*;
use groupdb_txn::{EntityWrite, InMemoryCoordinationService, WriteOutcome};
use std::time::Duration;

const TAGS: [&str; 4] = ["billing", "mail", "reports", "search"];
const TASKS_PER_WRITER: u64 = 5;

fn task_key(tag: &str, n: u64) -> Vec<u8> {
    row_key(&group_member(tag, "Task", n))
}

#[tokio::test(start_paused = true)]
async fn writers_keep_their_order_and_interleave() {
    init_tracing();
    let recording = Arc::new(RecordingColumnStore::new(
        Arc::new(InMemoryColumnStore::new()),
        Duration::from_millis(2),
    ));
    let store = table_store_over(Arc::clone(&recording));
    let coordinator = Arc::new(coordinator_over(
        Arc::clone(&store),
        Arc::new(InMemoryCoordinationService::new()),
    ));

    let writers: Vec<_> = TAGS
        .into_iter()
        .map(|tag| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let ctx = CallContext::new();
                let table = pull_queue_table(tag);
                for n in 0..TASKS_PER_WRITER {
                    let write = EntityWrite::new(table.clone(), task_key(tag, n))
                        .with_column("payload", Bytes::from(format!("{tag}-{n}")));
                    let report = coordinator.put_entity(&ctx, write).await.unwrap();
                    assert_eq!(report.outcome, WriteOutcome::Written);
                    assert_eq!(report.transaction_id(), None);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    let queue_puts: Vec<StoreCall> = recording
        .calls_to("put")
        .into_iter()
        .filter(|call| TAGS.into_iter().any(|tag| call.table == pull_queue_table(tag)))
        .collect();
    assert_eq!(queue_puts.len(), TAGS.len() * TASKS_PER_WRITER as usize);

    for tag in TAGS {
        let table = pull_queue_table(tag);
        let keys: Vec<Vec<u8>> = queue_puts
            .iter()
            .filter(|call| call.table == table)
            .filter_map(|call| call.key.clone())
            .collect();
        let expected: Vec<Vec<u8>> = (0..TASKS_PER_WRITER).map(|n| task_key(tag, n)).collect();
        assert_eq!(keys, expected, "writer {tag} out of order");
    }

    // Four grouped runs would switch tables exactly three times.
    let switches = queue_puts
        .windows(2)
        .filter(|pair| pair[0].table != pair[1].table)
        .count();
    assert!(switches > TAGS.len() - 1, "writers ran one after another");

    let ctx = CallContext::new();
    for tag in TAGS {
        let rows = store
            .get_table(&ctx, &pull_queue_table(tag), &["payload"])
            .await
            .unwrap();
        assert_eq!(rows.len(), TASKS_PER_WRITER as usize);
    }
    assert_eq!(coordinator.service().held_locks(), 0);
}
