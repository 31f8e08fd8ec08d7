pub mod collections_snapshot;
pub mod runner;

pub use collections_snapshot::CollectionsSnapshot;
pub use runner::{Migration, MigrationLedger, MigrationRunner};

use crate::core::Result;

/// Runner pre-loaded with every built-in migration, in order.
pub fn builtin_runner() -> Result<MigrationRunner> {
    MigrationRunner::new().with(Box::new(CollectionsSnapshot))
}
