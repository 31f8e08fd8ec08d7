pub mod collection;
pub mod error;
pub mod field;

pub use collection::{CollectionDefinition, CollectionKind};
pub use error::{Result, SchemaError};
pub use field::{
    FieldDefinition, FieldOptions, FileOptions, NumberOptions, RelationOptions, TextOptions,
};
