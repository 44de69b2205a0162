//! Drives the sync engine against a scripted HTTP client.
//!
//! Run with:
//!
//! ```text
//! cargo run -p daybook_sync_engine --example offline_sync
//! ```

use daybook_core::{KeyValueStore, MemoryKeyValueStore, MemoryRecordStore, Record, RecordStore};
use daybook_sync_engine::{
    record_to_payload, HttpResponse, MockHttpClient, PullApplier, PullCallback, SyncConfig,
    SyncEngine,
};
use daybook_sync_protocol::{PullChange, SessionTokens, SyncOperation};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mock = Arc::new(MockHttpClient::new());
    let kv = Arc::new(MemoryKeyValueStore::new());
    let records = Arc::new(MemoryRecordStore::new());

    // A local edit waiting to reach the server.
    let record = Record::new("water the plants");
    let op = SyncOperation::create(record.id.clone(), record_to_payload(&record));
    records.upsert(record).unwrap();

    // Script one push acknowledgement and one pull batch; later cycles
    // fail as transport errors and are retried, which shows up in the log.
    mock.push_response(HttpResponse::json(
        200,
        format!(r#"{{"applied":["{}"],"conflicts":[],"new_cursor":"1"}}"#, op.op_id),
    ));
    mock.push_response(HttpResponse::json(
        200,
        r#"{"changes":[{"cursor":"2","entity_id":"srv-1","operation":"upsert","snapshot":{"ID":"srv-1","Title":"from another device","Status":"pending","Version":1}}],"next_cursor":"2"}"#,
    ));

    let engine = SyncEngine::new(
        SyncConfig::new("https://api.example.com")
            .with_push_interval(Duration::from_millis(50))
            .with_pull_interval(Duration::from_millis(50)),
        Arc::clone(&mock),
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        Arc::clone(&records) as Arc<dyn RecordStore>,
    );
    engine.session().set_tokens(SessionTokens::new("demo-access", "demo-refresh"));
    engine.queue().add(op);

    let applier_records = Arc::clone(&records);
    let callback: PullCallback = Arc::new(move |changes: &[PullChange]| {
        let applier = PullApplier::new(Arc::clone(&applier_records) as Arc<dyn RecordStore>);
        applier.apply(changes, Some("demo-user")).unwrap();
    });

    engine.start(Some(callback));
    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.stop();

    let stats = engine.stats();
    println!("cursor: {}", engine.cursor());
    println!("pending operations: {}", engine.queue().len());
    println!(
        "pushed: {}, pulled: {}, conflicts: {}",
        stats.operations_pushed, stats.changes_pulled, stats.conflicts_seen
    );
    for record in records.list().unwrap() {
        println!("record {} -> {:?} ({})", record.id, record.status, record.content);
    }
}
