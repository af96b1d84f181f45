use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::schema::signature::schema_checksum;
use crate::schema::types::{CollectionSchema, CollectionSchemaColumn, CollectionSchemaTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableMigrationKind {
    Create,
    Modify,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnOperationKind {
    Add,
    Modify,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOperation {
    pub kind: ColumnOperationKind,
    pub column: CollectionSchemaColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMigration {
    pub kind: TableMigrationKind,
    pub table_name: String,
    pub column_operations: Vec<ColumnOperation>,
}

/// The ordered table/column operations that bring a collection's live
/// schema in line with its current definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub collection_key: String,
    pub tables: Vec<TableMigration>,
}

impl MigrationPlan {
    pub fn empty(collection_key: impl Into<String>) -> Self {
        Self {
            collection_key: collection_key.into(),
            tables: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_operation_count(&self) -> usize {
        self.tables
            .iter()
            .map(|table| table.column_operations.len())
            .sum()
    }

    pub fn table(&self, table_name: &str) -> Option<&TableMigration> {
        self.tables
            .iter()
            .find(|table| table.table_name == table_name)
    }
}

/// Diffs the latest persisted schema against fresh inference output.
///
/// Pure: no I/O. Equal checksums short-circuit to an empty plan without
/// walking any table.
pub fn generate_migration_plan(
    existing: Option<&CollectionSchema>,
    current: &CollectionSchema,
) -> Result<MigrationPlan> {
    let Some(existing) = existing else {
        // Never migrated: every table is created with its full column set.
        let tables = current
            .tables
            .iter()
            .map(create_table_migration)
            .collect();
        return Ok(MigrationPlan {
            collection_key: current.key.clone(),
            tables,
        });
    };

    if schema_checksum(existing)? == schema_checksum(current)? {
        return Ok(MigrationPlan::empty(current.key.clone()));
    }

    let mut tables = Vec::new();
    for table in &current.tables {
        match existing.table(&table.name) {
            None => tables.push(create_table_migration(table)),
            Some(previous) => {
                let operations = diff_columns(previous, table);
                if !operations.is_empty() {
                    tables.push(TableMigration {
                        kind: TableMigrationKind::Modify,
                        table_name: table.name.clone(),
                        column_operations: operations,
                    });
                }
            }
        }
    }

    // Whole tables that vanished from the definition. Dropped deepest path
    // first so nested repeater tables go before their parents.
    let mut removed: Vec<&CollectionSchemaTable> = existing
        .tables
        .iter()
        .filter(|table| current.table(&table.name).is_none())
        .collect();
    removed.sort_by(|a, b| {
        b.key
            .depth()
            .cmp(&a.key.depth())
            .then_with(|| a.name.cmp(&b.name))
    });
    for table in removed {
        tables.push(TableMigration {
            kind: TableMigrationKind::Remove,
            table_name: table.name.clone(),
            column_operations: Vec::new(),
        });
    }

    Ok(MigrationPlan {
        collection_key: current.key.clone(),
        tables,
    })
}

fn create_table_migration(table: &CollectionSchemaTable) -> TableMigration {
    TableMigration {
        kind: TableMigrationKind::Create,
        table_name: table.name.clone(),
        column_operations: table
            .columns
            .iter()
            .map(|column| ColumnOperation {
                kind: ColumnOperationKind::Add,
                column: column.clone(),
            })
            .collect(),
    }
}

fn diff_columns(
    previous: &CollectionSchemaTable,
    current: &CollectionSchemaTable,
) -> Vec<ColumnOperation> {
    let mut operations = Vec::new();

    for column in &current.columns {
        match previous.column(&column.name) {
            None => operations.push(ColumnOperation {
                kind: ColumnOperationKind::Add,
                column: column.clone(),
            }),
            Some(prev) if columns_differ(prev, column) => operations.push(ColumnOperation {
                kind: ColumnOperationKind::Modify,
                column: column.clone(),
            }),
            Some(_) => {}
        }
    }

    for column in &previous.columns {
        if current.column(&column.name).is_some() {
            continue;
        }
        // Field-sourced columns may hold user content, and the primary key
        // is protected; neither is ever dropped automatically. Orphaned
        // field columns surface through the migration status report for a
        // human-directed decision.
        if column.can_auto_remove {
            operations.push(ColumnOperation {
                kind: ColumnOperationKind::Remove,
                column: column.clone(),
            });
        }
    }

    operations
}

fn columns_differ(previous: &CollectionSchemaColumn, current: &CollectionSchemaColumn) -> bool {
    previous.data_type != current.data_type
        || previous.nullable != current.nullable
        || previous.default != current.default
        || previous.unique != current.unique
        || previous.foreign_key != current.foreign_key
}
