use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::naming::{FIELDS_TABLE_SUFFIX, field_key_from_column};
use crate::schema::types::{CollectionSchema, CollectionSchemaTable, ColumnSource, TableType};

/// Drift report for one collection: which configured fields have no backing
/// column yet, judged purely against the latest snapshot. Never touches the
/// live database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub collection_key: String,
    pub requires_migration: bool,
    /// Table identifier (`fields`, a brick key, or a dotted repeater path)
    /// → declared keys of fields whose backing column does not exist yet.
    pub missing_columns: BTreeMap<String, Vec<String>>,
}

impl MigrationStatus {
    /// Per-field flag for admin-facing editors: editing continues on other
    /// fields while this one is visually marked as drifted.
    pub fn field_requires_migration(&self, identifier: &str, field_key: &str) -> bool {
        self.missing_columns
            .get(identifier)
            .is_some_and(|keys| keys.iter().any(|key| key == field_key))
    }
}

/// Computes the drift report from the latest persisted snapshot and a fresh
/// inference of the current definition. No snapshot means the whole
/// collection still requires migration.
pub fn collection_migration_status(
    existing: Option<&CollectionSchema>,
    current: &CollectionSchema,
) -> MigrationStatus {
    let mut missing_columns: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for table in &current.tables {
        let Some(identifier) = table_identifier(table) else {
            continue;
        };
        let existing_table = existing.and_then(|schema| schema.table(&table.name));

        let mut missing = Vec::new();
        for column in &table.columns {
            if column.source != ColumnSource::Field {
                continue;
            }
            let backed = existing_table.is_some_and(|table| table.has_column(&column.name));
            if !backed
                && let Some(field_key) = field_key_from_column(&column.name)
            {
                missing.push(field_key.to_string());
            }
        }
        if !missing.is_empty() {
            missing_columns.insert(identifier, missing);
        }
    }

    MigrationStatus {
        collection_key: current.key.clone(),
        requires_migration: existing.is_none() || !missing_columns.is_empty(),
        missing_columns,
    }
}

fn table_identifier(table: &CollectionSchemaTable) -> Option<String> {
    match table.table_type {
        TableType::DocumentFields => Some(FIELDS_TABLE_SUFFIX.to_string()),
        TableType::Brick => table.key.brick.clone(),
        TableType::Repeater => {
            let mut segments: Vec<String> = Vec::new();
            if let Some(brick) = &table.key.brick {
                segments.push(brick.clone());
            }
            if let Some(path) = &table.key.repeater {
                segments.extend(path.iter().cloned());
            }
            Some(segments.join("."))
        }
        // Document and versions tables carry core columns only.
        TableType::Document | TableType::Versions => None,
    }
}
