pub mod infer;
pub mod naming;
pub mod signature;
pub mod types;

pub use infer::{MAX_REPEATER_DEPTH, infer_collection_schema};
pub use signature::{collection_signature, schema_checksum};
pub use types::{
    CollectionSchema, CollectionSchemaColumn, CollectionSchemaTable, ColumnSource, ForeignKeyRef,
    ReferentialAction, TableKey, TableType,
};
