pub mod executor;
pub mod plan;
pub mod snapshot;
pub mod status;

pub use executor::MigrationExecutor;
pub use plan::{
    ColumnOperation, ColumnOperationKind, MigrationPlan, TableMigration, TableMigrationKind,
    generate_migration_plan,
};
pub use snapshot::{
    InMemorySnapshotStore, SNAPSHOT_PAYLOAD_VERSION, SchemaSnapshot, SnapshotStore,
    SqlSnapshotStore,
};
pub use status::{MigrationStatus, collection_migration_status};
