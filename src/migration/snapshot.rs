use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, OnceCell};

use crate::connection::SqlConnection;
use crate::core::{DataType, Result, SchemaError};
use crate::dialect::{Dialect, sql_escape_string};
use crate::result::QueryResult;
use crate::schema::naming::MIGRATIONS_TABLE;
use crate::schema::types::CollectionSchema;

use super::plan::MigrationPlan;

/// Storage format version of the serialized schema/plan payloads. Bumping it
/// is a meta-migration concern, independent of collection migrations.
pub const SNAPSHOT_PAYLOAD_VERSION: u32 = 1;

#[derive(Serialize)]
struct VersionedPayloadRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct VersionedPayload<T> {
    version: u32,
    data: T,
}

fn encode_payload<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(&VersionedPayloadRef {
        version: SNAPSHOT_PAYLOAD_VERSION,
        data,
    })?)
}

fn decode_payload<T: DeserializeOwned>(json: &str) -> Result<T> {
    let payload: VersionedPayload<T> = serde_json::from_str(json)?;
    if payload.version != SNAPSHOT_PAYLOAD_VERSION {
        return Err(SchemaError::Snapshot(format!(
            "unsupported snapshot payload version {}",
            payload.version
        )));
    }
    Ok(payload.data)
}

/// One durable row of migration history: the schema that was live after the
/// migration, and the plan(s) that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub id: i64,
    pub collection_key: String,
    pub migration_plans: Vec<MigrationPlan>,
    pub collection_schema: CollectionSchema,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of applied migrations; rows are never updated or
/// deleted, and "latest" always means the maximum id per collection key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn latest(&self, collection_key: &str) -> Result<Option<SchemaSnapshot>>;

    /// Latest row per key, resolved with a single query so startup cost
    /// stays bounded as the collection count grows.
    async fn latest_many(
        &self,
        collection_keys: &[String],
    ) -> Result<HashMap<String, SchemaSnapshot>>;

    async fn append(
        &self,
        collection_key: &str,
        schema: &CollectionSchema,
        plans: &[MigrationPlan],
    ) -> Result<SchemaSnapshot>;
}

/// Snapshot store over the engine's own `lucid_collection_migrations` table.
pub struct SqlSnapshotStore {
    connection: Arc<dyn SqlConnection>,
    dialect: Arc<dyn Dialect>,
    table_ready: OnceCell<()>,
}

impl SqlSnapshotStore {
    pub fn new(connection: Arc<dyn SqlConnection>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            connection,
            dialect,
            table_ready: OnceCell::new(),
        }
    }

    async fn ensure_table(&self) -> Result<()> {
        self.table_ready
            .get_or_try_init(|| async {
                let dialect = self.dialect.as_ref();
                let sql = format!(
                    "CREATE TABLE IF NOT EXISTS {} ({}, {} {} NOT NULL, {} {} NOT NULL, {} {} NOT NULL, {} {} NOT NULL)",
                    dialect.quote(MIGRATIONS_TABLE),
                    dialect.primary_key_column_sql("id", &dialect.column_type(DataType::Integer)),
                    dialect.quote("collection_key"),
                    dialect.column_type(DataType::Text),
                    dialect.quote("migration_plans"),
                    dialect.column_type(DataType::Json),
                    dialect.quote("collection_schema"),
                    dialect.column_type(DataType::Json),
                    dialect.quote("created_at"),
                    dialect.column_type(DataType::Timestamp),
                );
                self.connection.execute(&sql).await.map(|_| ())
            })
            .await
            .map(|_| ())
    }

    fn select_clause(&self) -> String {
        let dialect = self.dialect.as_ref();
        format!(
            "SELECT {}, {}, {}, {}, {} FROM {}",
            dialect.quote("id"),
            dialect.quote("collection_key"),
            dialect.quote("migration_plans"),
            dialect.quote("collection_schema"),
            dialect.quote("created_at"),
            dialect.quote(MIGRATIONS_TABLE),
        )
    }
}

#[async_trait]
impl SnapshotStore for SqlSnapshotStore {
    async fn latest(&self, collection_key: &str) -> Result<Option<SchemaSnapshot>> {
        self.ensure_table().await?;
        let dialect = self.dialect.as_ref();
        let sql = format!(
            "{} WHERE {} = '{}' ORDER BY {} DESC LIMIT 1",
            self.select_clause(),
            dialect.quote("collection_key"),
            sql_escape_string(collection_key),
            dialect.quote("id"),
        );
        let result = self.connection.query(&sql).await?;
        if result.is_empty() {
            Ok(None)
        } else {
            snapshot_from_row(&result, 0).map(Some)
        }
    }

    async fn latest_many(
        &self,
        collection_keys: &[String],
    ) -> Result<HashMap<String, SchemaSnapshot>> {
        if collection_keys.is_empty() {
            return Ok(HashMap::new());
        }
        self.ensure_table().await?;
        let dialect = self.dialect.as_ref();
        let keys: Vec<String> = collection_keys
            .iter()
            .map(|key| format!("'{}'", sql_escape_string(key)))
            .collect();
        let sql = format!(
            "{} WHERE {} IN ({})",
            self.select_clause(),
            dialect.quote("collection_key"),
            keys.join(", "),
        );
        let result = self.connection.query(&sql).await?;

        // One round-trip; group by key keeping only the maximum id.
        let mut latest: HashMap<String, SchemaSnapshot> = HashMap::new();
        for row in 0..result.row_count() {
            let snapshot = snapshot_from_row(&result, row)?;
            match latest.get(&snapshot.collection_key) {
                Some(existing) if existing.id >= snapshot.id => {}
                _ => {
                    latest.insert(snapshot.collection_key.clone(), snapshot);
                }
            }
        }
        Ok(latest)
    }

    async fn append(
        &self,
        collection_key: &str,
        schema: &CollectionSchema,
        plans: &[MigrationPlan],
    ) -> Result<SchemaSnapshot> {
        self.ensure_table().await?;
        let dialect = self.dialect.as_ref();
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES ('{}', '{}', '{}', '{}')",
            dialect.quote(MIGRATIONS_TABLE),
            dialect.quote("collection_key"),
            dialect.quote("migration_plans"),
            dialect.quote("collection_schema"),
            dialect.quote("created_at"),
            sql_escape_string(collection_key),
            sql_escape_string(&encode_payload(&plans)?),
            sql_escape_string(&encode_payload(schema)?),
            Utc::now().to_rfc3339(),
        );
        self.connection.execute(&sql).await?;
        self.latest(collection_key).await?.ok_or_else(|| {
            SchemaError::Snapshot(format!(
                "snapshot row for '{collection_key}' missing after insert"
            ))
        })
    }
}

fn snapshot_from_row(result: &QueryResult, row: usize) -> Result<SchemaSnapshot> {
    let id = result
        .value(row, "id")
        .and_then(|value| value.as_i64())
        .ok_or_else(|| SchemaError::Snapshot("snapshot row has no numeric id".to_string()))?;
    let collection_key = result
        .value(row, "collection_key")
        .and_then(|value| value.as_str())
        .ok_or_else(|| SchemaError::Snapshot("snapshot row has no collection key".to_string()))?
        .to_string();
    let plans_json = result
        .value(row, "migration_plans")
        .and_then(|value| value.as_str())
        .ok_or_else(|| SchemaError::Snapshot("snapshot row has no migration plans".to_string()))?;
    let schema_json = result
        .value(row, "collection_schema")
        .and_then(|value| value.as_str())
        .ok_or_else(|| SchemaError::Snapshot("snapshot row has no schema payload".to_string()))?;
    let created_raw = result
        .value(row, "created_at")
        .and_then(|value| value.as_str())
        .ok_or_else(|| SchemaError::Snapshot("snapshot row has no timestamp".to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(created_raw)
        .map_err(|err| SchemaError::Snapshot(format!("invalid snapshot timestamp: {err}")))?
        .with_timezone(&Utc);

    Ok(SchemaSnapshot {
        id,
        collection_key,
        migration_plans: decode_payload(plans_json)?,
        collection_schema: decode_payload(schema_json)?,
        created_at,
    })
}

/// In-memory store for tests and embedded use; same append-only contract.
pub struct InMemorySnapshotStore {
    rows: Mutex<Vec<SchemaSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn latest(&self, collection_key: &str) -> Result<Option<SchemaSnapshot>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|row| row.collection_key == collection_key)
            .max_by_key(|row| row.id)
            .cloned())
    }

    async fn latest_many(
        &self,
        collection_keys: &[String],
    ) -> Result<HashMap<String, SchemaSnapshot>> {
        let rows = self.rows.lock().await;
        let mut latest: HashMap<String, SchemaSnapshot> = HashMap::new();
        for row in rows.iter() {
            if !collection_keys.contains(&row.collection_key) {
                continue;
            }
            match latest.get(&row.collection_key) {
                Some(existing) if existing.id >= row.id => {}
                _ => {
                    latest.insert(row.collection_key.clone(), row.clone());
                }
            }
        }
        Ok(latest)
    }

    async fn append(
        &self,
        collection_key: &str,
        schema: &CollectionSchema,
        plans: &[MigrationPlan],
    ) -> Result<SchemaSnapshot> {
        let mut rows = self.rows.lock().await;
        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        let snapshot = SchemaSnapshot {
            id,
            collection_key: collection_key.to_string(),
            migration_plans: plans.to_vec(),
            collection_schema: schema.clone(),
            created_at: Utc::now(),
        };
        rows.push(snapshot.clone());
        Ok(snapshot)
    }
}
