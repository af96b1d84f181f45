use serde::{Deserialize, Serialize};

use super::field::FieldDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionMode {
    /// Exactly one document (e.g. a settings page).
    Single,
    /// Any number of documents.
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrickType {
    /// Editors add any number of instances through the page builder.
    Builder,
    /// Always present on every document.
    Fixed,
}

/// A reusable, named group of fields attachable to a collection's documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickDefinition {
    key: String,
    brick_type: BrickType,
    fields: Vec<FieldDefinition>,
}

impl BrickDefinition {
    pub fn builder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            brick_type: BrickType::Builder,
            fields: Vec::new(),
        }
    }

    pub fn fixed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            brick_type: BrickType::Fixed,
            fields: Vec::new(),
        }
    }

    pub fn add_field(mut self, field: impl Into<FieldDefinition>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn brick_type(&self) -> BrickType {
        self.brick_type
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }
}

/// A declarative content-model definition: typed fields, attached bricks and
/// versioning options. Definitions are plain data; schema inference walks
/// them to derive the relational layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    key: String,
    mode: CollectionMode,
    use_drafts: bool,
    use_revisions: bool,
    use_translations: bool,
    fields: Vec<FieldDefinition>,
    bricks: Vec<BrickDefinition>,
}

impl CollectionDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mode: CollectionMode::Multiple,
            use_drafts: false,
            use_revisions: false,
            use_translations: false,
            fields: Vec::new(),
            bricks: Vec::new(),
        }
    }

    pub fn single(mut self) -> Self {
        self.mode = CollectionMode::Single;
        self
    }

    pub fn with_drafts(mut self) -> Self {
        self.use_drafts = true;
        self
    }

    pub fn with_revisions(mut self) -> Self {
        self.use_revisions = true;
        self
    }

    pub fn with_translations(mut self) -> Self {
        self.use_translations = true;
        self
    }

    pub fn add_field(mut self, field: impl Into<FieldDefinition>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn add_brick(mut self, brick: BrickDefinition) -> Self {
        self.bricks.push(brick);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> CollectionMode {
        self.mode
    }

    pub fn uses_drafts(&self) -> bool {
        self.use_drafts
    }

    pub fn uses_revisions(&self) -> bool {
        self.use_revisions
    }

    pub fn uses_translations(&self) -> bool {
        self.use_translations
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn bricks(&self) -> &[BrickDefinition] {
        &self.bricks
    }

    /// Keys of column-backed top-level fields, in declaration order. Listing
    /// queries select exactly these.
    pub fn included_field_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.has_column())
            .map(|field| field.key())
            .collect()
    }

    /// Canonical form for signing. Brick attachment order carries no
    /// semantics, so it is normalized; field order stays as declared because
    /// it drives the include list.
    pub(crate) fn canonical(&self) -> Self {
        let mut canonical = self.clone();
        canonical
            .bricks
            .sort_by(|a, b| a.key().cmp(b.key()));
        canonical
    }
}
