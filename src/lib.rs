// ============================================================================
// schemastore Library
// ============================================================================

pub mod core;
pub mod migrations;
pub mod storage;

// Re-export main types for convenience
pub use core::{CollectionDefinition, CollectionKind, FieldDefinition, Result, SchemaError};
pub use migrations::{builtin_runner, Migration, MigrationLedger, MigrationRunner};
pub use storage::{ImportSummary, SchemaStore};
