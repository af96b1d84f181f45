//! Composes DDL statements from a dialect's capability contract.

use super::Dialect;
use crate::migration::plan::{ColumnOperation, ColumnOperationKind};
use crate::schema::types::CollectionSchemaColumn;

pub fn column_definition_sql(dialect: &dyn Dialect, column: &CollectionSchemaColumn) -> String {
    if column.primary_key {
        return dialect.primary_key_column_sql(&column.name, &column.data_type);
    }

    let mut sql = format!("{} {}", dialect.quote(&column.name), column.data_type);
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&dialect.format_default(default));
    }
    if let Some(foreign_key) = &column.foreign_key {
        sql.push_str(&format!(
            " REFERENCES {}({}) ON DELETE {} ON UPDATE {}",
            dialect.quote(&foreign_key.table),
            dialect.quote(&foreign_key.column),
            foreign_key.on_delete.sql(),
            foreign_key.on_update.sql(),
        ));
    }
    sql
}

/// One DDL call building the table with its full initial column set,
/// primary key and declared foreign keys. `IF NOT EXISTS` keeps a retried
/// migration idempotent after a failure that prevented the snapshot write.
pub fn create_table_sql(
    dialect: &dyn Dialect,
    table_name: &str,
    columns: &[&CollectionSchemaColumn],
) -> String {
    let definitions: Vec<String> = columns
        .iter()
        .map(|column| column_definition_sql(dialect, column))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote(table_name),
        definitions.join(", ")
    )
}

pub fn drop_table_sql(dialect: &dyn Dialect, table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", dialect.quote(table_name))
}

/// The ALTER TABLE clause for one column operation.
pub fn column_operation_clause(dialect: &dyn Dialect, operation: &ColumnOperation) -> String {
    match operation.kind {
        ColumnOperationKind::Add => {
            format!("ADD COLUMN {}", column_definition_sql(dialect, &operation.column))
        }
        ColumnOperationKind::Modify => {
            dialect.modify_column_clause(&column_definition_sql(dialect, &operation.column))
        }
        ColumnOperationKind::Remove => {
            format!("DROP COLUMN {}", dialect.quote(&operation.column.name))
        }
    }
}

/// Folds every column operation for one table into a single statement.
pub fn batched_alter_table_sql(
    dialect: &dyn Dialect,
    table_name: &str,
    operations: &[ColumnOperation],
) -> String {
    let clauses: Vec<String> = operations
        .iter()
        .map(|operation| column_operation_clause(dialect, operation))
        .collect();
    format!("ALTER TABLE {} {}", dialect.quote(table_name), clauses.join(", "))
}

/// One statement for one column operation, for backends that cannot batch.
pub fn single_alter_table_sql(
    dialect: &dyn Dialect,
    table_name: &str,
    operation: &ColumnOperation,
) -> String {
    format!(
        "ALTER TABLE {} {}",
        dialect.quote(table_name),
        column_operation_clause(dialect, operation)
    )
}
