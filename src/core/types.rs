use serde::{Deserialize, Serialize};

/// Logical column types. The dialect adapter maps these to concrete SQL
/// type names, so field definitions never hard-code a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Column default values, kept in logical form and compared structurally by
/// the plan generator. The dialect formats them into SQL literals at DDL
/// render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum DefaultValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Json(serde_json::Value),
    /// Current timestamp at row creation.
    Now,
    Null,
}
