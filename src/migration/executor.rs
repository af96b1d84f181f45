use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::connection::SqlConnection;
use crate::core::{Result, SchemaError};
use crate::dialect::{Dialect, render};
use crate::schema::types::CollectionSchemaColumn;

use super::plan::{
    ColumnOperation, ColumnOperationKind, MigrationPlan, TableMigration, TableMigrationKind,
};

/// Applies migration plans against a live connection, adapting to the
/// backend's ALTER TABLE capability.
#[derive(Clone)]
pub struct MigrationExecutor {
    connection: Arc<dyn SqlConnection>,
    dialect: Arc<dyn Dialect>,
}

impl MigrationExecutor {
    pub fn new(connection: Arc<dyn SqlConnection>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Applies a whole plan. Creates and removes run sequentially in plan
    /// order (intra-collection foreign keys depend on it); modifications for
    /// different tables are dispatched concurrently.
    pub async fn apply_plan(&self, plan: &MigrationPlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }
        info!(
            collection = %plan.collection_key,
            tables = plan.tables.len(),
            operations = plan.column_operation_count(),
            "applying migration plan"
        );

        for migration in self.tables_of(plan, TableMigrationKind::Create) {
            self.apply_table(migration).await?;
        }
        try_join_all(
            self.tables_of(plan, TableMigrationKind::Modify)
                .map(|migration| self.apply_table(migration)),
        )
        .await?;
        for migration in self.tables_of(plan, TableMigrationKind::Remove) {
            self.apply_table(migration).await?;
        }
        Ok(())
    }

    /// Applies one table migration fully, or fails with an error naming the
    /// table and the operation that stopped it.
    pub async fn apply_table(&self, migration: &TableMigration) -> Result<()> {
        let dialect = self.dialect.as_ref();
        match migration.kind {
            TableMigrationKind::Create => {
                // Table creation with its initial column set is one DDL call.
                let columns: Vec<&CollectionSchemaColumn> = migration
                    .column_operations
                    .iter()
                    .map(|operation| &operation.column)
                    .collect();
                let sql = render::create_table_sql(dialect, &migration.table_name, &columns);
                debug!(table = %migration.table_name, "creating table");
                self.run(&sql, &migration.table_name, "create-table").await
            }
            TableMigrationKind::Remove => {
                let sql = render::drop_table_sql(dialect, &migration.table_name);
                debug!(table = %migration.table_name, "dropping table");
                self.run(&sql, &migration.table_name, "drop-table").await
            }
            TableMigrationKind::Modify => {
                if dialect.supports_batched_alter() {
                    let sql = render::batched_alter_table_sql(
                        dialect,
                        &migration.table_name,
                        &migration.column_operations,
                    );
                    debug!(
                        table = %migration.table_name,
                        operations = migration.column_operations.len(),
                        "altering table (batched)"
                    );
                    return self.run(&sql, &migration.table_name, "alter-table").await;
                }
                // One statement per operation; sequential within a table to
                // avoid backend lock contention.
                for operation in &migration.column_operations {
                    let sql = render::single_alter_table_sql(
                        dialect,
                        &migration.table_name,
                        operation,
                    );
                    debug!(table = %migration.table_name, operation = %operation_label(operation), "altering table");
                    self.run(&sql, &migration.table_name, &operation_label(operation))
                        .await?;
                }
                Ok(())
            }
        }
    }

    async fn run(&self, sql: &str, table: &str, operation: &str) -> Result<()> {
        self.connection
            .execute(sql)
            .await
            .map_err(|err| SchemaError::Execution {
                table: table.to_string(),
                operation: operation.to_string(),
                message: err.to_string(),
            })?;
        Ok(())
    }

    fn tables_of<'a>(
        &self,
        plan: &'a MigrationPlan,
        kind: TableMigrationKind,
    ) -> impl Iterator<Item = &'a TableMigration> {
        plan.tables
            .iter()
            .filter(move |migration| migration.kind == kind)
    }
}

fn operation_label(operation: &ColumnOperation) -> String {
    match operation.kind {
        ColumnOperationKind::Add => format!("add-column {}", operation.column.name),
        ColumnOperationKind::Modify => format!("modify-column {}", operation.column.name),
        ColumnOperationKind::Remove => format!("drop-column {}", operation.column.name),
    }
}
