pub mod collection;
pub mod field;

pub use collection::{BrickDefinition, BrickType, CollectionDefinition, CollectionMode};
pub use field::{
    BooleanField, DocumentReferenceField, FieldDefinition, JsonField, MediaField, NumberField,
    RepeaterField, RichContentField, TextField, UserField,
};
