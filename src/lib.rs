// ============================================================================
// SchemaSync Library
// ============================================================================

pub mod cache;
pub mod connection;
pub mod core;
pub mod dialect;
pub mod facade;
pub mod migration;
pub mod model;
pub mod result;
pub mod schema;

// Re-export main types for convenience
pub use facade::MigrationEngine;
pub use core::{DataType, DefaultValue, Result, SchemaError, Value};
pub use result::QueryResult;

pub use cache::{InMemoryKvStore, KeyValueStore, RuntimeSchema, SchemaCache, SingleFlight};
pub use connection::SqlConnection;
pub use dialect::Dialect;
pub use migration::{
    ColumnOperation, ColumnOperationKind, InMemorySnapshotStore, MigrationExecutor, MigrationPlan,
    MigrationStatus, SchemaSnapshot, SnapshotStore, SqlSnapshotStore, TableMigration,
    TableMigrationKind, collection_migration_status, generate_migration_plan,
};
pub use model::{
    BooleanField, BrickDefinition, BrickType, CollectionDefinition, CollectionMode,
    DocumentReferenceField, FieldDefinition, JsonField, MediaField, NumberField, RepeaterField,
    RichContentField, TextField, UserField,
};
pub use schema::{
    CollectionSchema, CollectionSchemaColumn, CollectionSchemaTable, ColumnSource, ForeignKeyRef,
    ReferentialAction, TableKey, TableType, collection_signature, infer_collection_schema,
    schema_checksum,
};
