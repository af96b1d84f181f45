pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, SchemaError};
pub use types::{DataType, DefaultValue};
pub use value::{Row, Value};
