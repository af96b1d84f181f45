mod common;

use std::sync::Arc;

use common::{RecordingConnection, TestDialect};
use schemasync::{
    CollectionDefinition, CollectionSchema, InMemorySnapshotStore, MigrationPlan, QueryResult,
    SchemaError, SnapshotStore, SqlSnapshotStore, TextField, Value, infer_collection_schema,
};

fn pages_schema() -> CollectionSchema {
    let definition = CollectionDefinition::new("pages").add_field(TextField::new("title"));
    infer_collection_schema(&definition, &TestDialect::batched()).unwrap()
}

fn payload<T: serde::Serialize>(data: &T) -> String {
    serde_json::json!({ "version": 1, "data": data }).to_string()
}

fn snapshot_row(id: i64, collection_key: &str, schema: &CollectionSchema) -> Vec<Value> {
    vec![
        Value::Integer(id),
        Value::Text(collection_key.to_string()),
        Value::Text(payload(&vec![MigrationPlan::empty(collection_key)])),
        Value::Text(payload(schema)),
        Value::Text("2026-08-01T10:00:00+00:00".to_string()),
    ]
}

fn snapshot_result(rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::new(
        vec![
            "id".to_string(),
            "collection_key".to_string(),
            "migration_plans".to_string(),
            "collection_schema".to_string(),
            "created_at".to_string(),
        ],
        rows,
    )
}

#[tokio::test]
async fn in_memory_store_returns_the_latest_row_per_key() {
    let store = InMemorySnapshotStore::new();
    let schema = pages_schema();

    store
        .append("pages", &schema, &[MigrationPlan::empty("pages")])
        .await
        .unwrap();
    let second = store
        .append("pages", &schema, &[MigrationPlan::empty("pages")])
        .await
        .unwrap();
    store
        .append("posts", &schema, &[MigrationPlan::empty("posts")])
        .await
        .unwrap();

    let latest = store.latest("pages").await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);

    let many = store
        .latest_many(&["pages".to_string(), "posts".to_string(), "ghost".to_string()])
        .await
        .unwrap();
    assert_eq!(many.len(), 2);
    assert_eq!(many["pages"].id, second.id);
    assert!(!many.contains_key("ghost"));
}

#[tokio::test]
async fn sql_store_creates_its_table_lazily_and_once() {
    let connection = Arc::new(RecordingConnection::new());
    let store = SqlSnapshotStore::new(connection.clone(), Arc::new(TestDialect::batched()));

    store.latest("pages").await.unwrap();
    store.latest("pages").await.unwrap();

    let creates = connection.executed_matching("CREATE TABLE IF NOT EXISTS \"lucid_collection_migrations\"");
    assert_eq!(creates.len(), 1);
}

#[tokio::test]
async fn sql_store_latest_parses_the_newest_row() {
    let connection = Arc::new(RecordingConnection::new());
    let store = SqlSnapshotStore::new(connection.clone(), Arc::new(TestDialect::batched()));
    let schema = pages_schema();

    connection.queue_result(snapshot_result(vec![snapshot_row(7, "pages", &schema)]));
    let snapshot = store.latest("pages").await.unwrap().unwrap();

    assert_eq!(snapshot.id, 7);
    assert_eq!(snapshot.collection_key, "pages");
    assert_eq!(snapshot.collection_schema, schema);

    let selects = connection.executed_matching("SELECT");
    assert_eq!(selects.len(), 1);
    assert!(selects[0].contains("ORDER BY \"id\" DESC LIMIT 1"));
}

#[tokio::test]
async fn sql_store_batches_latest_lookups_into_one_query() {
    let connection = Arc::new(RecordingConnection::new());
    let store = SqlSnapshotStore::new(connection.clone(), Arc::new(TestDialect::batched()));
    let schema = pages_schema();

    // Full history for both keys comes back in one result set; the store
    // keeps only the maximum id per key.
    connection.queue_result(snapshot_result(vec![
        snapshot_row(1, "pages", &schema),
        snapshot_row(4, "pages", &schema),
        snapshot_row(2, "posts", &schema),
    ]));

    let many = store
        .latest_many(&["pages".to_string(), "posts".to_string()])
        .await
        .unwrap();

    assert_eq!(many["pages"].id, 4);
    assert_eq!(many["posts"].id, 2);

    let selects = connection.executed_matching("SELECT");
    assert_eq!(selects.len(), 1, "batched lookup must be a single query");
    assert!(selects[0].contains("IN ('pages', 'posts')"));
}

#[tokio::test]
async fn sql_store_append_inserts_and_reads_back() {
    let connection = Arc::new(RecordingConnection::new());
    let store = SqlSnapshotStore::new(connection.clone(), Arc::new(TestDialect::batched()));
    let schema = pages_schema();

    // Scripted read-back for the post-insert latest lookup.
    connection.queue_result(snapshot_result(vec![snapshot_row(1, "pages", &schema)]));

    let plan = MigrationPlan::empty("pages");
    let snapshot = store
        .append("pages", &schema, std::slice::from_ref(&plan))
        .await
        .unwrap();
    assert_eq!(snapshot.id, 1);

    let inserts = connection.executed_matching("INSERT INTO \"lucid_collection_migrations\"");
    assert_eq!(inserts.len(), 1);
    assert!(inserts[0].contains("'pages'"));
    assert!(inserts[0].contains("\"version\""));
}

#[tokio::test]
async fn unknown_payload_versions_are_rejected() {
    let connection = Arc::new(RecordingConnection::new());
    let store = SqlSnapshotStore::new(connection.clone(), Arc::new(TestDialect::batched()));
    let schema = pages_schema();

    let mut row = snapshot_row(1, "pages", &schema);
    row[3] = Value::Text(
        serde_json::json!({ "version": 99, "data": serde_json::to_value(&schema).unwrap() })
            .to_string(),
    );
    connection.queue_result(snapshot_result(vec![row]));

    let err = store.latest("pages").await.unwrap_err();
    assert!(matches!(err, SchemaError::Snapshot(message)
        if message.contains("version 99")));
}
