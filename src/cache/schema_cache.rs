use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::Result;
use crate::migration::plan::MigrationPlan;
use crate::schema::types::CollectionSchema;

use super::kv::KeyValueStore;
use super::single_flight::SingleFlight;

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

fn durable_key(signature: &str) -> String {
    format!("schemasync:schema:{signature}")
}

/// A read-ready schema resolved through the migration pipeline. Document
/// read/write services use it to map field keys to live table and column
/// names before building queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSchema {
    pub collection_key: String,
    pub signature: String,
    pub schema: CollectionSchema,
    /// The plan applied when this schema version was first resolved; empty
    /// when the collection was already up to date.
    pub plan: MigrationPlan,
}

/// Two-tier (process memory + durable KV) memoization of resolved schemas,
/// keyed by definition signature, with single-flight de-duplication.
///
/// Constructed at startup and injected into the services that need it;
/// never an ambient singleton.
pub struct SchemaCache {
    memory: Mutex<LruCache<String, Arc<RuntimeSchema>>>,
    durable: Option<Arc<dyn KeyValueStore>>,
    durable_ttl: Option<Duration>,
    flight: SingleFlight<Arc<RuntimeSchema>>,
}

impl SchemaCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory: Mutex::new(LruCache::new(capacity)),
            durable: None,
            durable_ttl: None,
            flight: SingleFlight::new(),
        }
    }

    /// Attaches the durable tier. Reads fall through to it on memory misses;
    /// writes are best-effort.
    pub fn with_durable(mut self, store: Arc<dyn KeyValueStore>, ttl: Option<Duration>) -> Self {
        self.durable = Some(store);
        self.durable_ttl = ttl;
        self
    }

    pub fn cached(&self, signature: &str) -> Option<Arc<RuntimeSchema>> {
        self.memory.lock().ok()?.get(signature).cloned()
    }

    /// Resolves a signature through memory, then the durable tier, then the
    /// given computation; concurrent callers for one signature share a
    /// single computation. Durable-tier failures are logged and treated as
    /// misses, since correctness rests on the snapshot store, not the cache.
    pub async fn resolve<F>(&self, signature: &str, compute: F) -> Result<Arc<RuntimeSchema>>
    where
        F: Future<Output = Result<RuntimeSchema>> + Send + 'static,
    {
        if let Some(hit) = self.cached(signature) {
            return Ok(hit);
        }

        let durable = self.durable.clone();
        let ttl = self.durable_ttl;
        let key = durable_key(signature);
        let resolved = self
            .flight
            .run(signature, async move {
                if let Some(store) = &durable {
                    match store.get(&key).await {
                        Ok(Some(value)) => {
                            match serde_json::from_value::<RuntimeSchema>(value) {
                                Ok(schema) => return Ok(Arc::new(schema)),
                                Err(err) => {
                                    warn!(error = %err, "discarding undecodable cache entry")
                                }
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(error = %err, "durable cache read failed, treating as miss")
                        }
                    }
                }

                let computed = compute.await?;

                if let Some(store) = &durable {
                    match serde_json::to_value(&computed) {
                        Ok(value) => {
                            if let Err(err) = store.set(&key, value, ttl).await {
                                warn!(error = %err, "durable cache write failed");
                            }
                        }
                        Err(err) => warn!(error = %err, "could not serialize cache entry"),
                    }
                }
                Ok(Arc::new(computed))
            })
            .await?;

        if let Ok(mut memory) = self.memory.lock() {
            memory.put(signature.to_string(), resolved.clone());
        }
        Ok(resolved)
    }
}
