pub mod catalog;
pub mod persistence;
pub mod store;

pub use catalog::Catalog;
pub use persistence::{SnapshotManager, StoreSnapshot};
pub use store::{ImportSummary, SchemaStore};
