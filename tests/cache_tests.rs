mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::TestDialect;
use schemasync::{
    CollectionDefinition, InMemoryKvStore, KeyValueStore, MigrationPlan, Result, RuntimeSchema,
    SchemaCache, SchemaError, TextField, collection_signature, infer_collection_schema,
};

fn runtime_schema(signature: &str) -> RuntimeSchema {
    let definition = CollectionDefinition::new("pages").add_field(TextField::new("title"));
    RuntimeSchema {
        collection_key: "pages".to_string(),
        signature: signature.to_string(),
        schema: infer_collection_schema(&definition, &TestDialect::batched()).unwrap(),
        plan: MigrationPlan::empty("pages"),
    }
}

fn signature() -> String {
    let definition = CollectionDefinition::new("pages").add_field(TextField::new("title"));
    collection_signature(&definition).unwrap()
}

struct FailingKvStore;

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>> {
        Err(SchemaError::Cache("kv store unreachable".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Option<Duration>,
    ) -> Result<()> {
        Err(SchemaError::Cache("kv store unreachable".to_string()))
    }
}

#[tokio::test]
async fn concurrent_resolutions_share_one_computation() {
    let cache = Arc::new(SchemaCache::new(16));
    let signature = signature();
    let computations = Arc::new(AtomicUsize::new(0));

    let callers = (0..8).map(|_| {
        let cache = cache.clone();
        let signature = signature.clone();
        let computations = computations.clone();
        async move {
            let computed = signature.clone();
            cache
                .resolve(&signature, async move {
                    computations.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(runtime_schema(&computed))
                })
                .await
        }
    });
    let results = futures::future::join_all(callers).await;

    assert_eq!(computations.load(Ordering::SeqCst), 1);
    let first = results[0].as_ref().unwrap();
    for result in &results {
        assert_eq!(result.as_ref().unwrap(), first);
    }
}

#[tokio::test]
async fn memory_hits_skip_the_computation() {
    let cache = SchemaCache::new(16);
    let signature = signature();
    let computations = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let counter = computations.clone();
        let sig = signature.clone();
        cache
            .resolve(&signature, async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(runtime_schema(&sig))
            })
            .await
            .unwrap();
    }

    assert_eq!(computations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn durable_tier_is_read_through_across_processes() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
    let signature = signature();

    // First "process" computes and writes both tiers.
    let first = SchemaCache::new(16).with_durable(kv.clone(), None);
    let sig = signature.clone();
    first
        .resolve(&signature, async move { Ok(runtime_schema(&sig)) })
        .await
        .unwrap();

    // A fresh cache with an empty memory tier must hit the durable one; the
    // computation would fail the test if it ran.
    let second = SchemaCache::new(16).with_durable(kv, None);
    let resolved = second
        .resolve(&signature, async {
            Err(SchemaError::Cache("computation must not run".to_string()))
        })
        .await
        .unwrap();

    assert_eq!(resolved.signature, signature);
}

#[tokio::test]
async fn durable_tier_failures_fall_open() {
    let cache = SchemaCache::new(16).with_durable(Arc::new(FailingKvStore), None);
    let signature = signature();

    let sig = signature.clone();
    let resolved = cache
        .resolve(&signature, async move { Ok(runtime_schema(&sig)) })
        .await
        .unwrap();

    assert_eq!(resolved.collection_key, "pages");
}

#[tokio::test]
async fn failed_computations_are_not_cached() {
    let cache = SchemaCache::new(16);
    let signature = signature();

    let err = cache
        .resolve(&signature, async {
            Err(SchemaError::Inference("boom".to_string()))
        })
        .await
        .unwrap_err();
    assert_eq!(err, SchemaError::Inference("boom".to_string()));

    // The in-flight entry settled and was removed; a later request retries.
    let sig = signature.clone();
    let resolved = cache
        .resolve(&signature, async move { Ok(runtime_schema(&sig)) })
        .await
        .unwrap();
    assert_eq!(resolved.signature, signature);
}

#[tokio::test]
async fn kv_entries_honor_their_ttl() {
    let kv = InMemoryKvStore::new();
    kv.set(
        "schema:x",
        serde_json::json!({"ok": true}),
        Some(Duration::from_millis(5)),
    )
    .await
    .unwrap();

    assert!(kv.get("schema:x").await.unwrap().is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(kv.get("schema:x").await.unwrap().is_none());
}
