use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::cache::{DEFAULT_CACHE_CAPACITY, RuntimeSchema, SchemaCache};
use crate::connection::SqlConnection;
use crate::core::{Result, SchemaError};
use crate::dialect::Dialect;
use crate::migration::executor::MigrationExecutor;
use crate::migration::plan::{MigrationPlan, generate_migration_plan};
use crate::migration::snapshot::{SchemaSnapshot, SnapshotStore, SqlSnapshotStore};
use crate::migration::status::{MigrationStatus, collection_migration_status};
use crate::model::CollectionDefinition;
use crate::schema::infer::infer_collection_schema;
use crate::schema::signature::collection_signature;

/// The engine facade: owns the dialect, snapshot store and cache (injected
/// at construction, never ambient), and exposes the migration lifecycle to
/// the surrounding application.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use schemasync::{CollectionDefinition, MigrationEngine, TextField};
/// # use schemasync::{Dialect, SqlConnection};
/// # async fn demo(connection: Arc<dyn SqlConnection>, dialect: Arc<dyn Dialect>) -> schemasync::Result<()> {
/// let engine = MigrationEngine::new(connection, dialect);
///
/// let pages = CollectionDefinition::new("pages")
///     .add_field(TextField::new("title").required())
///     .add_field(TextField::new("slug").unique());
///
/// let plans = engine.migrate(&[pages]).await?;
/// println!("applied {} plan(s)", plans.len());
/// # Ok(())
/// # }
/// ```
pub struct MigrationEngine {
    dialect: Arc<dyn Dialect>,
    snapshots: Arc<dyn SnapshotStore>,
    cache: Arc<SchemaCache>,
    executor: MigrationExecutor,
}

impl MigrationEngine {
    /// Engine backed by the SQL snapshot store on the same connection and a
    /// memory-only cache.
    pub fn new(connection: Arc<dyn SqlConnection>, dialect: Arc<dyn Dialect>) -> Self {
        let snapshots: Arc<dyn SnapshotStore> =
            Arc::new(SqlSnapshotStore::new(connection.clone(), dialect.clone()));
        Self {
            executor: MigrationExecutor::new(connection, dialect.clone()),
            dialect,
            snapshots,
            cache: Arc::new(SchemaCache::new(DEFAULT_CACHE_CAPACITY)),
        }
    }

    pub fn with_snapshot_store(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Swaps in a shared cache, e.g. one with a durable KV tier attached.
    pub fn with_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Migrates every given collection: infer, diff against the latest
    /// snapshot, execute the plan, persist a new snapshot row. Collections
    /// are processed concurrently and fail independently; the first error is
    /// returned after every collection has settled. Returns the plan applied
    /// per collection, in input order.
    pub async fn migrate(
        &self,
        definitions: &[CollectionDefinition],
    ) -> Result<Vec<MigrationPlan>> {
        let keys: Vec<String> = definitions
            .iter()
            .map(|definition| definition.key().to_string())
            .collect();
        // One batched lookup for all collections, not one query each.
        let mut latest = self.snapshots.latest_many(&keys).await?;
        info!(collections = definitions.len(), "migrating collections");

        let pending = definitions.iter().map(|definition| {
            let existing = latest.remove(definition.key());
            async move {
                let signature = collection_signature(definition)?;
                // An existing cache entry means this signature was already
                // migrated; this call applies nothing.
                let was_cached = self.cache.cached(&signature).is_some();
                let runtime = self
                    .resolve_collection(definition, &signature, existing)
                    .await?;
                if was_cached {
                    Ok(MigrationPlan::empty(definition.key()))
                } else {
                    Ok(runtime.plan.clone())
                }
            }
        });
        let results = join_all(pending).await;

        let mut plans = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(plan) => plans.push(plan),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(plans),
        }
    }

    /// Dry run: the plan that would be applied right now, without touching
    /// the database.
    pub async fn plan(&self, definition: &CollectionDefinition) -> Result<MigrationPlan> {
        let current = infer_collection_schema(definition, self.dialect.as_ref())?;
        let existing = self.snapshots.latest(definition.key()).await?;
        generate_migration_plan(
            existing.as_ref().map(|snapshot| &snapshot.collection_schema),
            &current,
        )
    }

    /// Drift report used to gate document writes and annotate admin-facing
    /// field inputs.
    pub async fn status(&self, definition: &CollectionDefinition) -> Result<MigrationStatus> {
        let current = infer_collection_schema(definition, self.dialect.as_ref())?;
        let existing = self.snapshots.latest(definition.key()).await?;
        Ok(collection_migration_status(
            existing.as_ref().map(|snapshot| &snapshot.collection_schema),
            &current,
        ))
    }

    /// Refuses mutating document operations while any configured field lacks
    /// its backing column.
    pub async fn guard_write(&self, definition: &CollectionDefinition) -> Result<()> {
        let status = self.status(definition).await?;
        if status.requires_migration {
            return Err(SchemaError::MigrationRequired(definition.key().to_string()));
        }
        Ok(())
    }

    /// Fast path for document services: the resolved table/column layout for
    /// a collection, migrating it first if it has never been resolved.
    pub async fn runtime_schema(
        &self,
        definition: &CollectionDefinition,
    ) -> Result<Arc<RuntimeSchema>> {
        let signature = collection_signature(definition)?;
        if let Some(hit) = self.cache.cached(&signature) {
            return Ok(hit);
        }
        let existing = self.snapshots.latest(definition.key()).await?;
        self.resolve_collection(definition, &signature, existing).await
    }

    /// One collection's lifecycle. The whole pipeline runs inside the
    /// cache's single flight, so concurrent callers for the same signature
    /// never race to apply divergent plans.
    async fn resolve_collection(
        &self,
        definition: &CollectionDefinition,
        signature: &str,
        existing: Option<SchemaSnapshot>,
    ) -> Result<Arc<RuntimeSchema>> {
        let definition = definition.clone();
        let dialect = self.dialect.clone();
        let executor = self.executor.clone();
        let snapshots = self.snapshots.clone();
        let computed_signature = signature.to_string();
        self.cache
            .resolve(signature, async move {
                let current = infer_collection_schema(&definition, dialect.as_ref())?;
                let existing_schema = existing
                    .as_ref()
                    .map(|snapshot| &snapshot.collection_schema);
                let plan = generate_migration_plan(existing_schema, &current)?;

                if plan.is_empty() {
                    debug!(collection = %definition.key(), "schema up to date");
                } else {
                    executor.apply_plan(&plan).await?;
                    // A row is appended only when a plan actually changed
                    // state; failed executions leave the baseline untouched.
                    snapshots
                        .append(definition.key(), &current, std::slice::from_ref(&plan))
                        .await?;
                }

                Ok(RuntimeSchema {
                    collection_key: definition.key().to_string(),
                    signature: computed_signature,
                    schema: current,
                    plan,
                })
            })
            .await
    }
}
