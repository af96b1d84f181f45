mod common;

use common::TestDialect;
use schemasync::{
    BooleanField, CollectionDefinition, CollectionSchemaColumn, ColumnOperationKind,
    RepeaterField, TableMigrationKind, TextField, generate_migration_plan,
    infer_collection_schema,
};

fn pages_with_title() -> CollectionDefinition {
    CollectionDefinition::new("pages").add_field(TextField::new("title"))
}

#[test]
fn cold_start_creates_every_table_with_every_column() {
    let definition = pages_with_title();
    let current = infer_collection_schema(&definition, &TestDialect::batched()).unwrap();

    let plan = generate_migration_plan(None, &current).unwrap();

    assert_eq!(plan.collection_key, "pages");
    assert_eq!(plan.tables.len(), current.tables.len());
    for (migration, table) in plan.tables.iter().zip(&current.tables) {
        assert_eq!(migration.kind, TableMigrationKind::Create);
        assert_eq!(migration.table_name, table.name);
        assert_eq!(migration.column_operations.len(), table.columns.len());
        assert!(
            migration
                .column_operations
                .iter()
                .all(|operation| operation.kind == ColumnOperationKind::Add)
        );
    }
}

#[test]
fn equal_checksums_short_circuit_to_an_empty_plan() {
    let definition = pages_with_title();
    let dialect = TestDialect::batched();
    let existing = infer_collection_schema(&definition, &dialect).unwrap();
    let current = infer_collection_schema(&definition, &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn dropped_fields_never_remove_their_columns() {
    let dialect = TestDialect::batched();
    // The snapshot still has `_title` in the fields table.
    let existing = infer_collection_schema(&pages_with_title(), &dialect).unwrap();
    // The field was removed from the configured definition.
    let current =
        infer_collection_schema(&CollectionDefinition::new("pages"), &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();
    assert!(plan.is_empty(), "orphaned field column must be left in place");
}

#[test]
fn orphaned_core_columns_are_removed() {
    let definition = pages_with_title();
    let dialect = TestDialect::batched();
    let mut existing = infer_collection_schema(&definition, &dialect).unwrap();
    let current = infer_collection_schema(&definition, &dialect).unwrap();

    // A core column that no longer exists in the current layout.
    let fields_table = existing
        .tables
        .iter_mut()
        .find(|table| table.name == "lucid_document__pages__fields")
        .unwrap();
    fields_table
        .columns
        .push(CollectionSchemaColumn::core("legacy_flag", "BOOLEAN"));

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();

    assert_eq!(plan.tables.len(), 1);
    let migration = &plan.tables[0];
    assert_eq!(migration.kind, TableMigrationKind::Modify);
    assert_eq!(migration.table_name, "lucid_document__pages__fields");
    assert_eq!(migration.column_operations.len(), 1);
    let operation = &migration.column_operations[0];
    assert_eq!(operation.kind, ColumnOperationKind::Remove);
    assert_eq!(operation.column.name, "legacy_flag");
}

#[test]
fn protected_core_columns_survive_removal() {
    let definition = pages_with_title();
    let dialect = TestDialect::batched();
    let mut existing = infer_collection_schema(&definition, &dialect).unwrap();
    let current = infer_collection_schema(&definition, &dialect).unwrap();

    // A protected column, as if the layout once carried a second key.
    let fields_table = existing
        .tables
        .iter_mut()
        .find(|table| table.name == "lucid_document__pages__fields")
        .unwrap();
    fields_table
        .columns
        .push(CollectionSchemaColumn::core("legacy_id", "INTEGER").primary_key());

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn changed_attributes_yield_modify_not_add_and_remove() {
    let dialect = TestDialect::batched();
    let existing = infer_collection_schema(&pages_with_title(), &dialect).unwrap();
    let changed = CollectionDefinition::new("pages")
        .add_field(TextField::new("title").required().unique());
    let current = infer_collection_schema(&changed, &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();

    assert_eq!(plan.tables.len(), 1);
    let migration = &plan.tables[0];
    assert_eq!(migration.kind, TableMigrationKind::Modify);
    assert_eq!(migration.column_operations.len(), 1);
    let operation = &migration.column_operations[0];
    assert_eq!(operation.kind, ColumnOperationKind::Modify);
    assert_eq!(operation.column.name, "_title");
    assert!(!operation.column.nullable);
    assert!(operation.column.unique);
}

#[test]
fn changed_default_is_detected_structurally() {
    let dialect = TestDialect::batched();
    let existing = infer_collection_schema(
        &CollectionDefinition::new("pages").add_field(BooleanField::new("published")),
        &dialect,
    )
    .unwrap();
    let current = infer_collection_schema(
        &CollectionDefinition::new("pages")
            .add_field(BooleanField::new("published").default_value(false)),
        &dialect,
    )
    .unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();
    let migration = &plan.tables[0];
    assert_eq!(migration.column_operations[0].kind, ColumnOperationKind::Modify);
}

#[test]
fn added_fields_yield_add_operations() {
    let dialect = TestDialect::batched();
    let existing = infer_collection_schema(&pages_with_title(), &dialect).unwrap();
    let grown = pages_with_title().add_field(TextField::new("subtitle"));
    let current = infer_collection_schema(&grown, &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();

    assert_eq!(plan.tables.len(), 1);
    let migration = &plan.tables[0];
    assert_eq!(migration.kind, TableMigrationKind::Modify);
    assert_eq!(migration.column_operations.len(), 1);
    assert_eq!(migration.column_operations[0].kind, ColumnOperationKind::Add);
    assert_eq!(migration.column_operations[0].column.name, "_subtitle");
}

#[test]
fn new_repeaters_create_their_tables() {
    let dialect = TestDialect::batched();
    let existing = infer_collection_schema(&pages_with_title(), &dialect).unwrap();
    let grown = pages_with_title()
        .add_field(RepeaterField::new("authors").add_field(TextField::new("name")));
    let current = infer_collection_schema(&grown, &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();

    let created = plan.table("lucid_document__pages__authors").unwrap();
    assert_eq!(created.kind, TableMigrationKind::Create);
    assert!(
        created
            .column_operations
            .iter()
            .any(|operation| operation.column.name == "_name")
    );
}

#[test]
fn vanished_tables_are_removed_deepest_first() {
    let dialect = TestDialect::batched();
    let nested = pages_with_title().add_field(
        RepeaterField::new("authors").add_field(
            RepeaterField::new("books").add_field(TextField::new("title")),
        ),
    );
    let existing = infer_collection_schema(&nested, &dialect).unwrap();
    let current = infer_collection_schema(&pages_with_title(), &dialect).unwrap();

    let plan = generate_migration_plan(Some(&existing), &current).unwrap();

    let removals: Vec<&str> = plan
        .tables
        .iter()
        .filter(|migration| migration.kind == TableMigrationKind::Remove)
        .map(|migration| migration.table_name.as_str())
        .collect();
    assert_eq!(
        removals,
        vec![
            "lucid_document__pages__authors__books",
            "lucid_document__pages__authors"
        ]
    );
    for migration in &plan.tables {
        if migration.kind == TableMigrationKind::Remove {
            assert!(migration.column_operations.is_empty());
        }
    }
}
