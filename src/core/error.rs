use thiserror::Error;

/// Errors produced by the schema migration pipeline.
///
/// The enum is `Clone` so that concurrent callers coalesced by the
/// single-flight cache all observe the leader's failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Duplicate column '{0}' in table '{1}'")]
    DuplicateColumn(String, String),

    #[error("Duplicate table '{0}' for collection '{1}'")]
    DuplicateTable(String, String),

    #[error("Invalid key '{0}': {1}")]
    InvalidKey(String, String),

    #[error("Repeater '{0}' exceeds the maximum nesting depth of {1}")]
    RepeaterDepth(String, usize),

    #[error("Collection '{0}' requires migration")]
    MigrationRequired(String),

    #[error("Migration failed on table '{table}' ({operation}): {message}")]
    Execution {
        table: String,
        operation: String,
        message: String,
    },

    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SchemaError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Cache(err.to_string())
    }
}
