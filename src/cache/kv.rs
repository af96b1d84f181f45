use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::Result;

/// The durable cache tier contract: a generic key-value store with optional
/// per-key TTL. Values are JSON; nothing else is assumed about the backing
/// service.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<()>;
}

struct KvEntry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

/// In-process implementation for tests and single-node embedded use.
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, KvEntry>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at.is_some_and(|at| at <= Instant::now()) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            KvEntry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
