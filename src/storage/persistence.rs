//! On-disk persistence for the schema catalog.

use crate::core::{CollectionDefinition, Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Serialized form of the whole catalog, written as one unit on commit.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub collections: Vec<CollectionDefinition>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub collection_count: usize,
}

impl StoreSnapshot {
    pub fn new(collections: Vec<CollectionDefinition>) -> Self {
        let collection_count = collections.len();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            version: 1,
            collections,
            metadata: SnapshotMetadata {
                created_at,
                collection_count,
            },
        }
    }
}

/// Writes `data` to `path` through a temp file in the same directory,
/// then renames over the target. Readers never observe a partial file.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| SchemaError::Storage(format!("Path '{}' has no parent", path.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| SchemaError::Storage(format!("Failed to create data directory: {}", e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| SchemaError::Storage(format!("Failed to create temp file: {}", e)))?;
    temp.write_all(data)
        .map_err(|e| SchemaError::Storage(format!("Failed to write temp file: {}", e)))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SchemaError::Storage(format!("Failed to sync temp file: {}", e)))?;
    temp.persist(path)
        .map_err(|e| SchemaError::Storage(format!("Failed to replace '{}': {}", path.display(), e)))?;
    Ok(())
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)
        .map_err(|e| SchemaError::Storage(format!("Failed to open '{}': {}", path.display(), e)))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| SchemaError::Storage(format!("Failed to read '{}': {}", path.display(), e)))?;
    Ok(data)
}

/// Owns the snapshot file and (de)serializes the catalog to it.
pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| SchemaError::Storage(format!("Failed to serialize snapshot: {}", e)))?;
        write_atomic(&self.snapshot_path, &serialized)
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = read_file(&self.snapshot_path)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| SchemaError::Storage(format!("Failed to deserialize snapshot: {}", e)))?;
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}
