use serde::{Deserialize, Serialize};

use crate::core::DefaultValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableType {
    Document,
    Versions,
    DocumentFields,
    Brick,
    Repeater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnSource {
    /// Fixed columns every table of its type carries.
    Core,
    /// Generated from a user-defined field; may hold user content.
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }
}

/// A single column of an inferred table. `data_type` holds the dialect's SQL
/// type name so persisted snapshots stay comparable against fresh inference
/// on the same backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchemaColumn {
    pub name: String,
    pub source: ColumnSource,
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
    #[serde(default)]
    pub primary_key: bool,
    pub can_auto_remove: bool,
}

impl CollectionSchemaColumn {
    pub fn core(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ColumnSource::Core,
            data_type: data_type.into(),
            nullable: true,
            default: None,
            unique: false,
            foreign_key: None,
            primary_key: false,
            can_auto_remove: true,
        }
    }

    /// Field-sourced columns hold user content and are never auto-removed.
    pub fn field(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ColumnSource::Field,
            data_type: data_type.into(),
            nullable: true,
            default: None,
            unique: false,
            foreign_key: None,
            primary_key: false,
            can_auto_remove: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the primary key; protected from auto-removal.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self.can_auto_remove = false;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyRef) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

/// Identifies where a table sits in the collection's model tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableKey {
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brick: Option<String>,
    /// Ordered repeater keys from the root to this table's nesting level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeater: Option<Vec<String>>,
}

impl TableKey {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            brick: None,
            repeater: None,
        }
    }

    pub fn with_brick(mut self, brick: impl Into<String>) -> Self {
        self.brick = Some(brick.into());
        self
    }

    pub fn with_repeater(mut self, path: Vec<String>) -> Self {
        self.repeater = Some(path);
        self
    }

    /// Nesting depth used to order whole-table removals (children first).
    pub fn depth(&self) -> usize {
        self.brick.iter().count() + self.repeater.as_ref().map_or(0, |path| path.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchemaTable {
    pub name: String,
    pub table_type: TableType,
    pub key: TableKey,
    pub columns: Vec<CollectionSchemaColumn>,
}

impl CollectionSchemaTable {
    pub fn column(&self, name: &str) -> Option<&CollectionSchemaColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// The normalized relational schema inferred from one collection definition.
/// Produced fresh on every evaluation; compared or persisted, never mutated
/// in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub key: String,
    pub tables: Vec<CollectionSchemaTable>,
}

impl CollectionSchema {
    pub fn table(&self, name: &str) -> Option<&CollectionSchemaTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name.as_str()).collect()
    }
}
