use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One entry in a collection's field tree.
///
/// Closed union: each kind carries only the attributes meaningful to it, and
/// schema inference pattern-matches over the kinds instead of probing shared
/// properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldDefinition {
    Text(TextField),
    Number(NumberField),
    Boolean(BooleanField),
    Media(MediaField),
    User(UserField),
    DocumentReference(DocumentReferenceField),
    RichContent(RichContentField),
    Json(JsonField),
    Repeater(RepeaterField),
}

impl FieldDefinition {
    pub fn key(&self) -> &str {
        match self {
            Self::Text(f) => &f.key,
            Self::Number(f) => &f.key,
            Self::Boolean(f) => &f.key,
            Self::Media(f) => &f.key,
            Self::User(f) => &f.key,
            Self::DocumentReference(f) => &f.key,
            Self::RichContent(f) => &f.key,
            Self::Json(f) => &f.key,
            Self::Repeater(f) => &f.key,
        }
    }

    /// Whether the field is rendered as a physical column. Repeaters never
    /// are; they spawn a child table instead.
    pub fn has_column(&self) -> bool {
        match self {
            Self::Text(f) => f.column,
            Self::Number(f) => f.column,
            Self::Boolean(f) => f.column,
            Self::Media(f) => f.column,
            Self::User(f) => f.column,
            Self::DocumentReference(f) => f.column,
            Self::RichContent(f) => f.column,
            Self::Json(f) => f.column,
            Self::Repeater(_) => false,
        }
    }

    pub fn as_repeater(&self) -> Option<&RepeaterField> {
        match self {
            Self::Repeater(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl TextField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            translatable: false,
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Keep the field virtual: validated and listed, but never backed by a
    /// column.
    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<f64>,
}

impl NumberField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            translatable: false,
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub default: Option<bool>,
}

impl BooleanField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            default: None,
        }
    }

    pub fn default_value(mut self, value: bool) -> Self {
        self.default = Some(value);
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

/// References a row in the global media library table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub required: bool,
}

impl MediaField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            translatable: false,
            required: false,
        }
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

/// References a row in the global users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub required: bool,
}

impl UserField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

/// References a document in another collection. Stored as a plain id; no
/// database-level foreign key is emitted, so collections that reference each
/// other can migrate in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReferenceField {
    pub key: String,
    pub collection: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub required: bool,
}

impl DocumentReferenceField {
    pub fn new(key: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            collection: collection.into(),
            column: true,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

/// Structured rich-text content, stored as a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichContentField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub translatable: bool,
}

impl RichContentField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            translatable: false,
        }
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonField {
    pub key: String,
    #[serde(default = "default_true")]
    pub column: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl JsonField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: true,
            default: None,
        }
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn without_column(mut self) -> Self {
        self.column = false;
        self
    }
}

/// An ordered list of nested field groups. Each group becomes a row in a
/// child table keyed by the repeater's nesting path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeaterField {
    pub key: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl RepeaterField {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(mut self, field: impl Into<FieldDefinition>) -> Self {
        self.fields.push(field.into());
        self
    }
}

impl From<TextField> for FieldDefinition {
    fn from(field: TextField) -> Self {
        Self::Text(field)
    }
}

impl From<NumberField> for FieldDefinition {
    fn from(field: NumberField) -> Self {
        Self::Number(field)
    }
}

impl From<BooleanField> for FieldDefinition {
    fn from(field: BooleanField) -> Self {
        Self::Boolean(field)
    }
}

impl From<MediaField> for FieldDefinition {
    fn from(field: MediaField) -> Self {
        Self::Media(field)
    }
}

impl From<UserField> for FieldDefinition {
    fn from(field: UserField) -> Self {
        Self::User(field)
    }
}

impl From<DocumentReferenceField> for FieldDefinition {
    fn from(field: DocumentReferenceField) -> Self {
        Self::DocumentReference(field)
    }
}

impl From<RichContentField> for FieldDefinition {
    fn from(field: RichContentField) -> Self {
        Self::RichContent(field)
    }
}

impl From<JsonField> for FieldDefinition {
    fn from(field: JsonField) -> Self {
        Self::Json(field)
    }
}

impl From<RepeaterField> for FieldDefinition {
    fn from(field: RepeaterField) -> Self {
        Self::Repeater(field)
    }
}
