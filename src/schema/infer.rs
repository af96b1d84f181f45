use std::collections::{HashSet, VecDeque};

use crate::core::{DataType, DefaultValue, Result, SchemaError};
use crate::dialect::Dialect;
use crate::model::{BrickDefinition, CollectionDefinition, FieldDefinition};

use super::naming;
use super::types::{
    CollectionSchema, CollectionSchemaColumn, CollectionSchemaTable, ForeignKeyRef,
    ReferentialAction, TableKey, TableType,
};

/// Repeaters nest at most this deep below their table root.
pub const MAX_REPEATER_DEPTH: usize = 3;

/// A fields-bearing table waiting to be built during the breadth-first walk.
struct PendingTable<'a> {
    name: String,
    table_type: TableType,
    brick: Option<String>,
    repeater_path: Vec<String>,
    fields: &'a [FieldDefinition],
}

/// Infers the normalized multi-table schema for one collection definition.
///
/// Pure: no I/O. Deterministic: an unchanged definition always yields a
/// structurally identical schema, which the checksum fast path relies on.
pub fn infer_collection_schema(
    definition: &CollectionDefinition,
    dialect: &dyn Dialect,
) -> Result<CollectionSchema> {
    naming::validate_key("collection", definition.key())?;
    let collection = definition.key();

    let mut tables = Vec::new();
    tables.push(document_table(collection, dialect));
    tables.push(versions_table(collection, dialect));

    let mut queue: VecDeque<PendingTable<'_>> = VecDeque::new();
    queue.push_back(PendingTable {
        name: naming::fields_table_name(collection),
        table_type: TableType::DocumentFields,
        brick: None,
        repeater_path: Vec::new(),
        fields: definition.fields(),
    });

    // Brick attachment order is not semantic; walk them sorted so inference
    // stays deterministic under reordering.
    let mut bricks: Vec<&BrickDefinition> = definition.bricks().iter().collect();
    bricks.sort_by(|a, b| a.key().cmp(b.key()));
    for brick in bricks {
        naming::validate_table_key("brick", brick.key())?;
        queue.push_back(PendingTable {
            name: naming::brick_table_name(collection, brick.key()),
            table_type: TableType::Brick,
            brick: Some(brick.key().to_string()),
            repeater_path: Vec::new(),
            fields: brick.fields(),
        });
    }

    let mut seen_tables: HashSet<String> = tables.iter().map(|t| t.name.clone()).collect();

    while let Some(pending) = queue.pop_front() {
        if !seen_tables.insert(pending.name.clone()) {
            return Err(SchemaError::DuplicateTable(
                pending.name,
                collection.to_string(),
            ));
        }

        let mut columns = child_core_columns(
            collection,
            dialect,
            matches!(pending.table_type, TableType::Repeater),
        );
        let mut seen_columns: HashSet<String> =
            columns.iter().map(|column| column.name.clone()).collect();

        for field in pending.fields {
            naming::validate_key("field", field.key())?;

            if let Some(repeater) = field.as_repeater() {
                naming::validate_table_key("repeater", repeater.key.as_str())?;
                if pending.repeater_path.len() + 1 > MAX_REPEATER_DEPTH {
                    return Err(SchemaError::RepeaterDepth(
                        repeater.key.clone(),
                        MAX_REPEATER_DEPTH,
                    ));
                }
                let mut path = pending.repeater_path.clone();
                path.push(repeater.key.clone());
                queue.push_back(PendingTable {
                    name: naming::repeater_table_name(
                        collection,
                        pending.brick.as_deref(),
                        &path,
                    ),
                    table_type: TableType::Repeater,
                    brick: pending.brick.clone(),
                    repeater_path: path,
                    fields: &repeater.fields,
                });
                continue;
            }

            let Some(column) = field_column(field, dialect) else {
                continue;
            };
            if !seen_columns.insert(column.name.clone()) {
                return Err(SchemaError::DuplicateColumn(column.name, pending.name));
            }
            columns.push(column);
        }

        let mut key = TableKey::collection(collection);
        if let Some(brick) = pending.brick {
            key = key.with_brick(brick);
        }
        if !pending.repeater_path.is_empty() {
            key = key.with_repeater(pending.repeater_path);
        }
        tables.push(CollectionSchemaTable {
            name: pending.name,
            table_type: pending.table_type,
            key,
            columns,
        });
    }

    Ok(CollectionSchema {
        key: collection.to_string(),
        tables,
    })
}

/// The column a field contributes to its nearest enclosing table, or `None`
/// for virtual fields. Repeaters are handled by the walk itself.
fn field_column(field: &FieldDefinition, dialect: &dyn Dialect) -> Option<CollectionSchemaColumn> {
    if !field.has_column() {
        return None;
    }
    let name = naming::field_column_name(field.key());

    let column = match field {
        FieldDefinition::Text(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Text));
            column.nullable = !f.required;
            column.unique = f.unique;
            column.default = f.default.clone().map(DefaultValue::Text);
            column
        }
        FieldDefinition::Number(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Float));
            column.nullable = !f.required;
            column.unique = f.unique;
            column.default = f.default.map(DefaultValue::Float);
            column
        }
        FieldDefinition::Boolean(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Boolean));
            column.default = f.default.map(DefaultValue::Boolean);
            column
        }
        FieldDefinition::Media(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Integer));
            column.nullable = !f.required;
            column.foreign_key = Some(
                ForeignKeyRef::new(naming::MEDIA_TABLE, "id")
                    .on_delete(ReferentialAction::SetNull),
            );
            column
        }
        FieldDefinition::User(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Integer));
            column.nullable = !f.required;
            column.foreign_key = Some(
                ForeignKeyRef::new(naming::USERS_TABLE, "id")
                    .on_delete(ReferentialAction::SetNull),
            );
            column
        }
        // Cross-collection references stay FK-free so mutually-referencing
        // collections can migrate in any order.
        FieldDefinition::DocumentReference(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Integer));
            column.nullable = !f.required;
            column
        }
        FieldDefinition::RichContent(_) => {
            CollectionSchemaColumn::field(name, dialect.column_type(DataType::Json))
        }
        FieldDefinition::Json(f) => {
            let mut column =
                CollectionSchemaColumn::field(name, dialect.column_type(DataType::Json));
            column.default = f.default.clone().map(DefaultValue::Json);
            column
        }
        FieldDefinition::Repeater(_) => return None,
    };

    Some(column)
}

fn document_table(collection: &str, dialect: &dyn Dialect) -> CollectionSchemaTable {
    let ty = |data_type| dialect.column_type(data_type);
    let user_fk = || {
        ForeignKeyRef::new(naming::USERS_TABLE, "id").on_delete(ReferentialAction::SetNull)
    };
    let columns = vec![
        CollectionSchemaColumn::core("id", ty(DataType::Integer)).primary_key(),
        CollectionSchemaColumn::core("collection_key", ty(DataType::Text)).not_null(),
        CollectionSchemaColumn::core("is_deleted", ty(DataType::Boolean))
            .not_null()
            .with_default(DefaultValue::Boolean(false)),
        CollectionSchemaColumn::core("is_deleted_at", ty(DataType::Timestamp)),
        CollectionSchemaColumn::core("deleted_by", ty(DataType::Integer))
            .with_foreign_key(user_fk()),
        CollectionSchemaColumn::core("created_by", ty(DataType::Integer))
            .with_foreign_key(user_fk()),
        CollectionSchemaColumn::core("updated_by", ty(DataType::Integer))
            .with_foreign_key(user_fk()),
        CollectionSchemaColumn::core("created_at", ty(DataType::Timestamp))
            .with_default(DefaultValue::Now),
        CollectionSchemaColumn::core("updated_at", ty(DataType::Timestamp))
            .with_default(DefaultValue::Now),
    ];
    CollectionSchemaTable {
        name: naming::document_table_name(collection),
        table_type: TableType::Document,
        key: TableKey::collection(collection),
        columns,
    }
}

fn versions_table(collection: &str, dialect: &dyn Dialect) -> CollectionSchemaTable {
    let ty = |data_type| dialect.column_type(data_type);
    let columns = vec![
        CollectionSchemaColumn::core("id", ty(DataType::Integer)).primary_key(),
        CollectionSchemaColumn::core("collection_key", ty(DataType::Text)).not_null(),
        CollectionSchemaColumn::core("document_id", ty(DataType::Integer))
            .not_null()
            .with_foreign_key(
                ForeignKeyRef::new(naming::document_table_name(collection), "id")
                    .on_delete(ReferentialAction::Cascade),
            ),
        CollectionSchemaColumn::core("version_type", ty(DataType::Text))
            .not_null()
            .with_default(DefaultValue::Text("draft".to_string())),
        CollectionSchemaColumn::core("promoted_from", ty(DataType::Integer)),
        CollectionSchemaColumn::core("created_by", ty(DataType::Integer)).with_foreign_key(
            ForeignKeyRef::new(naming::USERS_TABLE, "id").on_delete(ReferentialAction::SetNull),
        ),
        CollectionSchemaColumn::core("created_at", ty(DataType::Timestamp))
            .with_default(DefaultValue::Now),
    ];
    CollectionSchemaTable {
        name: naming::versions_table_name(collection),
        table_type: TableType::Versions,
        key: TableKey::collection(collection),
        columns,
    }
}

/// Core columns shared by fields, brick and repeater tables. Repeater rows
/// are ordered, so their tables also carry a sort column.
fn child_core_columns(
    collection: &str,
    dialect: &dyn Dialect,
    with_sort: bool,
) -> Vec<CollectionSchemaColumn> {
    let ty = |data_type| dialect.column_type(data_type);
    let mut columns = vec![
        CollectionSchemaColumn::core("id", ty(DataType::Integer)).primary_key(),
        CollectionSchemaColumn::core("collection_key", ty(DataType::Text)).not_null(),
        CollectionSchemaColumn::core("locale", ty(DataType::Text)).not_null(),
        CollectionSchemaColumn::core("document_id", ty(DataType::Integer))
            .not_null()
            .with_foreign_key(
                ForeignKeyRef::new(naming::document_table_name(collection), "id")
                    .on_delete(ReferentialAction::Cascade),
            ),
        CollectionSchemaColumn::core("document_version_id", ty(DataType::Integer))
            .not_null()
            .with_foreign_key(
                ForeignKeyRef::new(naming::versions_table_name(collection), "id")
                    .on_delete(ReferentialAction::Cascade),
            ),
    ];
    if with_sort {
        columns.push(
            CollectionSchemaColumn::core("sort_order", ty(DataType::Integer))
                .not_null()
                .with_default(DefaultValue::Integer(0)),
        );
    }
    columns
}
