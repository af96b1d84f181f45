pub mod render;

use crate::core::{DataType, DefaultValue};

/// Escapes a string for inclusion in a SQL literal.
pub fn sql_escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Capability contract of a SQL backend adapter.
///
/// Inference and the executor are written against this trait only; concrete
/// drivers live outside the engine. Default method bodies follow common ANSI
/// behavior and are overridden where a backend deviates.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether multiple column operations fold into one ALTER TABLE
    /// statement. Backends without this get one statement per operation.
    fn supports_batched_alter(&self) -> bool;

    /// Whether integer primary keys auto-increment without an explicit
    /// sequence declaration.
    fn auto_increment_primary_key(&self) -> bool;

    /// SQL type name for a logical column type.
    fn column_type(&self, data_type: DataType) -> String;

    /// SQL literal for a logical default value.
    fn format_default(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Text(value) => format!("'{}'", sql_escape_string(value)),
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Float(value) => value.to_string(),
            DefaultValue::Boolean(true) => "TRUE".to_string(),
            DefaultValue::Boolean(false) => "FALSE".to_string(),
            DefaultValue::Json(value) => format!("'{}'", sql_escape_string(&value.to_string())),
            DefaultValue::Now => "CURRENT_TIMESTAMP".to_string(),
            DefaultValue::Null => "NULL".to_string(),
        }
    }

    fn quote(&self, identifier: &str) -> String {
        format!("\"{identifier}\"")
    }

    /// Full definition of the primary-key column.
    fn primary_key_column_sql(&self, name: &str, data_type: &str) -> String {
        if self.auto_increment_primary_key() {
            format!("{} {} PRIMARY KEY", self.quote(name), data_type)
        } else {
            format!("{} {} PRIMARY KEY AUTOINCREMENT", self.quote(name), data_type)
        }
    }

    /// ALTER TABLE clause re-declaring an existing column.
    fn modify_column_clause(&self, column_sql: &str) -> String {
        format!("MODIFY COLUMN {column_sql}")
    }
}
