use crate::core::{Result, SchemaError};

/// Prefix shared by every generated document table.
pub const DOCUMENT_TABLE_PREFIX: &str = "lucid_document";

/// Separator joining the prefix, collection key, brick key and repeater path.
pub const TABLE_NAME_SEPARATOR: &str = "__";

/// Suffix of the top-level document-fields table.
pub const FIELDS_TABLE_SUFFIX: &str = "fields";

/// Suffix of the versions table.
pub const VERSIONS_TABLE_SUFFIX: &str = "versions";

/// Reserved prefix of field-generated columns; core columns never carry it.
pub const FIELD_COLUMN_PREFIX: &str = "_";

/// Global tables that predate any collection migration.
pub const USERS_TABLE: &str = "lucid_users";
pub const MEDIA_TABLE: &str = "lucid_media";

/// The append-only snapshot table this engine owns.
pub const MIGRATIONS_TABLE: &str = "lucid_collection_migrations";

/// Table keys that would collide with the generated fields/versions tables.
const RESERVED_TABLE_KEYS: [&str; 2] = [FIELDS_TABLE_SUFFIX, VERSIONS_TABLE_SUFFIX];

pub fn document_table_name(collection: &str) -> String {
    format!("{DOCUMENT_TABLE_PREFIX}{TABLE_NAME_SEPARATOR}{collection}")
}

pub fn versions_table_name(collection: &str) -> String {
    format!(
        "{}{TABLE_NAME_SEPARATOR}{VERSIONS_TABLE_SUFFIX}",
        document_table_name(collection)
    )
}

pub fn fields_table_name(collection: &str) -> String {
    format!(
        "{}{TABLE_NAME_SEPARATOR}{FIELDS_TABLE_SUFFIX}",
        document_table_name(collection)
    )
}

pub fn brick_table_name(collection: &str, brick: &str) -> String {
    format!("{}{TABLE_NAME_SEPARATOR}{brick}", document_table_name(collection))
}

/// Repeater tables join the collection key, optional brick key and the full
/// repeater key path, so names stay collision-free for a fixed model.
pub fn repeater_table_name(collection: &str, brick: Option<&str>, path: &[String]) -> String {
    let mut name = match brick {
        Some(brick) => brick_table_name(collection, brick),
        None => document_table_name(collection),
    };
    for segment in path {
        name.push_str(TABLE_NAME_SEPARATOR);
        name.push_str(segment);
    }
    name
}

pub fn field_column_name(field_key: &str) -> String {
    format!("{FIELD_COLUMN_PREFIX}{field_key}")
}

/// Strips the reserved prefix, recovering the declared field key.
pub fn field_key_from_column(column_name: &str) -> Option<&str> {
    column_name.strip_prefix(FIELD_COLUMN_PREFIX)
}

/// Keys are embedded into identifiers verbatim, so they are restricted to
/// lowercase alphanumerics separated by single dashes or underscores.
pub fn validate_key(kind: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SchemaError::InvalidKey(
            key.to_string(),
            format!("{kind} key must not be empty"),
        ));
    }
    if key.starts_with(FIELD_COLUMN_PREFIX) {
        return Err(SchemaError::InvalidKey(
            key.to_string(),
            format!("{kind} key must not start with the reserved '{FIELD_COLUMN_PREFIX}' prefix"),
        ));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
    {
        return Err(SchemaError::InvalidKey(
            key.to_string(),
            format!("{kind} key may only contain lowercase alphanumerics, '-' and '_'"),
        ));
    }
    if key.contains(TABLE_NAME_SEPARATOR) {
        return Err(SchemaError::InvalidKey(
            key.to_string(),
            format!("{kind} key must not contain '{TABLE_NAME_SEPARATOR}'"),
        ));
    }
    Ok(())
}

/// Brick and repeater keys additionally must not shadow generated tables.
pub fn validate_table_key(kind: &str, key: &str) -> Result<()> {
    validate_key(kind, key)?;
    if RESERVED_TABLE_KEYS.contains(&key) {
        return Err(SchemaError::InvalidKey(
            key.to_string(),
            format!("{kind} key '{key}' is reserved"),
        ));
    }
    Ok(())
}
