use super::catalog::Catalog;
use super::persistence::{SnapshotManager, StoreSnapshot};
use crate::core::{CollectionDefinition, Result, SchemaError};
use log::info;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Outcome counters for one import call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// The persistent schema store: an in-memory catalog backed by a snapshot
/// file that is rewritten atomically on every committed change.
///
/// Callers are expected to hold exclusive access for the duration of a
/// mutation (`&mut self` enforces this); there is no internal concurrency.
pub struct SchemaStore {
    catalog: Catalog,
    snapshots: SnapshotManager,
    data_dir: PathBuf,
}

impl SchemaStore {
    /// Opens (or initializes) a store rooted at `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let snapshots = SnapshotManager::new(data_dir.join("schema.snapshot"));

        let catalog = match snapshots.load()? {
            Some(snapshot) => Catalog::from_collections(snapshot.collections)?,
            None => Catalog::new(),
        };

        Ok(Self {
            catalog,
            snapshots,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn collection(&self, id: &str) -> Option<&CollectionDefinition> {
        self.catalog.get(id)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<&CollectionDefinition> {
        self.catalog.get_by_name(name)
    }

    pub fn collection_count(&self) -> usize {
        self.catalog.len()
    }

    /// All collections, sorted by id.
    pub fn collections(&self) -> Vec<CollectionDefinition> {
        self.catalog.sorted()
    }

    /// Applies `definitions` to the store as one all-or-nothing operation.
    ///
    /// Existing collections with a matching id are replaced wholesale; the
    /// rest are created. With `delete_missing`, every non-system collection
    /// absent from `definitions` is deleted, unless a kept collection still
    /// references it through a relation field (`SchemaError::Constraint`).
    ///
    /// Every check runs against the union of `definitions` and the current
    /// catalog before anything is applied, so the order of `definitions`
    /// never matters. The next catalog is built on a private copy and the
    /// snapshot file is written before the in-memory swap; on any error the
    /// store is left unchanged.
    pub fn import_collections(
        &mut self,
        definitions: &[CollectionDefinition],
        delete_missing: bool,
        context: Option<&str>,
    ) -> Result<ImportSummary> {
        // Pass 1: standalone validity plus duplicate detection.
        let mut incoming_ids = HashSet::new();
        let mut incoming_names = HashSet::new();
        for definition in definitions {
            definition.validate()?;
            if !incoming_ids.insert(definition.id.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Duplicate collection id '{}' in import",
                    definition.id
                )));
            }
            if !incoming_names.insert(definition.name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Duplicate collection name '{}' in import",
                    definition.name
                )));
            }
        }

        // Name uniqueness against the store is a set property: incoming
        // names may only collide with collections that actually survive the
        // call (not replaced, not deleted), never with each other's old
        // names. Checked here so declaration order cannot matter.
        for collection in self.catalog.iter() {
            if incoming_ids.contains(collection.id.as_str()) {
                continue; // replaced by an incoming definition
            }
            if delete_missing && !collection.system {
                continue; // absent from the incoming list, about to be deleted
            }
            if incoming_names.contains(collection.name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Collection name '{}' is already used by '{}'",
                    collection.name, collection.id
                )));
            }
        }

        // Relation targets resolve against the union of the incoming
        // definitions and the current store, regardless of declaration order.
        let union: HashSet<&str> = incoming_ids
            .iter()
            .copied()
            .chain(self.catalog.ids())
            .collect();
        for definition in definitions {
            for target in definition.relation_targets() {
                if !union.contains(target) {
                    return Err(SchemaError::Validation(format!(
                        "Collection '{}' has a relation to unknown collection '{}'",
                        definition.name, target
                    )));
                }
            }
        }

        let to_delete: Vec<String> = if delete_missing {
            self.catalog
                .iter()
                .filter(|c| !c.system && !incoming_ids.contains(c.id.as_str()))
                .map(|c| c.id.clone())
                .collect()
        } else {
            Vec::new()
        };

        if !to_delete.is_empty() {
            let deleted_ids: HashSet<&str> = to_delete.iter().map(|s| s.as_str()).collect();
            // Kept collections are the incoming ones plus whatever survives
            // in the store (system collections). References among the deleted
            // set itself are fine.
            for definition in definitions {
                for target in definition.relation_targets() {
                    if deleted_ids.contains(target) {
                        return Err(SchemaError::Constraint(format!(
                            "Cannot delete collection '{}': still referenced by '{}'",
                            target, definition.name
                        )));
                    }
                }
            }
            for collection in self.catalog.iter() {
                if deleted_ids.contains(collection.id.as_str())
                    || incoming_ids.contains(collection.id.as_str())
                {
                    continue;
                }
                for target in collection.relation_targets() {
                    if deleted_ids.contains(target) {
                        return Err(SchemaError::Constraint(format!(
                            "Cannot delete collection '{}': still referenced by '{}'",
                            target, collection.name
                        )));
                    }
                }
            }
        }

        // Build the next catalog on a private copy; the live one stays
        // untouched until the snapshot write below has succeeded.
        let mut next = self.catalog.clone();
        for id in &to_delete {
            next = next.remove(id)?;
        }
        let mut summary = ImportSummary {
            deleted: to_delete.len(),
            ..Default::default()
        };
        // Clear every replaced collection before inserting any incoming one,
        // so a name handed from one collection to another within the same
        // call never trips the catalog's uniqueness check mid-apply.
        for definition in definitions {
            if self.catalog.contains(&definition.id) {
                summary.updated += 1;
                next = next.remove(&definition.id)?;
            } else {
                summary.created += 1;
            }
        }
        for definition in definitions {
            next = next.upsert(definition.clone())?;
        }

        self.snapshots.save(&StoreSnapshot::new(next.sorted()))?;
        self.catalog = next;

        info!(
            "Imported collections ({}): {} created, {} updated, {} deleted",
            context.unwrap_or("no context"),
            summary.created,
            summary.updated,
            summary.deleted
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollectionDefinition;
    use serde_json::json;
    use tempfile::TempDir;

    fn collection(id: &str, name: &str, schema: serde_json::Value) -> CollectionDefinition {
        CollectionDefinition::from_literal(json!({
            "id": id,
            "created": "2024-11-29 11:45:22.881Z",
            "updated": "2024-11-29 11:45:22.881Z",
            "name": name,
            "type": "base",
            "system": false,
            "schema": schema,
            "indexes": [],
            "listRule": null,
            "viewRule": null,
            "createRule": null,
            "updateRule": null,
            "deleteRule": null,
            "options": {}
        }))
        .unwrap()
    }

    fn relation_field(name: &str, target: &str) -> serde_json::Value {
        json!({
            "system": false,
            "id": format!("fld_{}", name),
            "name": name,
            "type": "relation",
            "required": false,
            "presentable": false,
            "unique": false,
            "options": {
                "collectionId": target,
                "cascadeDelete": false,
                "minSelect": null,
                "maxSelect": 1,
                "displayFields": null
            }
        })
    }

    #[test]
    fn test_import_creates_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = SchemaStore::open(temp_dir.path()).unwrap();
            let summary = store
                .import_collections(&[collection("a1", "users", json!([]))], false, None)
                .unwrap();
            assert_eq!(summary.created, 1);
        }

        // Reopen from disk.
        let store = SchemaStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.collection_count(), 1);
        assert_eq!(store.collection("a1").unwrap().name, "users");
    }

    #[test]
    fn test_import_replaces_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        store
            .import_collections(&[collection("a1", "users", json!([]))], false, None)
            .unwrap();
        let summary = store
            .import_collections(&[collection("a1", "accounts", json!([]))], false, None)
            .unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(store.collection("a1").unwrap().name, "accounts");
        assert!(store.collection_by_name("users").is_none());
    }

    #[test]
    fn test_duplicate_id_in_one_call_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        let err = store
            .import_collections(
                &[
                    collection("a1", "users", json!([])),
                    collection("a1", "jobs", json!([])),
                ],
                false,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
        assert_eq!(store.collection_count(), 0);
    }

    #[test]
    fn test_unresolved_relation_rejected_without_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();
        store
            .import_collections(&[collection("keep", "keep", json!([]))], false, None)
            .unwrap();
        let before = store.collections();

        let err = store
            .import_collections(
                &[collection(
                    "j1",
                    "jobs",
                    json!([relation_field("owner", "missing")]),
                )],
                false,
                None,
            )
            .unwrap_err();

        assert!(matches!(err, SchemaError::Validation(_)));
        assert_eq!(store.collections(), before);
    }

    #[test]
    fn test_relation_resolves_within_same_call() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        // Referencing collection listed before its target.
        store
            .import_collections(
                &[
                    collection("j1", "jobs", json!([relation_field("owner", "u1")])),
                    collection("u1", "users", json!([])),
                ],
                true,
                None,
            )
            .unwrap();
        assert_eq!(store.collection_count(), 2);
    }

    #[test]
    fn test_delete_missing_removes_absent_collections() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        store
            .import_collections(
                &[
                    collection("a1", "users", json!([])),
                    collection("b2", "jobs", json!([])),
                ],
                false,
                None,
            )
            .unwrap();

        let summary = store
            .import_collections(&[collection("a1", "users", json!([]))], true, None)
            .unwrap();

        assert_eq!(summary.deleted, 1);
        assert!(store.collection("b2").is_none());
    }

    #[test]
    fn test_delete_missing_blocked_by_inbound_relation() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        store
            .import_collections(
                &[
                    collection("u1", "users", json!([])),
                    collection("j1", "jobs", json!([relation_field("owner", "u1")])),
                ],
                false,
                None,
            )
            .unwrap();
        let before = store.collections();

        // Keeping jobs while dropping its relation target must fail.
        let err = store
            .import_collections(
                &[collection("j1", "jobs", json!([relation_field("owner", "u1")]))],
                true,
                None,
            )
            .unwrap_err();

        assert!(matches!(err, SchemaError::Constraint(_)));
        assert_eq!(store.collections(), before);
    }

    #[test]
    fn test_delete_missing_allows_dropping_whole_reference_group() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        store
            .import_collections(
                &[
                    collection("u1", "users", json!([])),
                    collection("j1", "jobs", json!([relation_field("owner", "u1")])),
                ],
                false,
                None,
            )
            .unwrap();

        // Both sides of the relation go away together.
        store
            .import_collections(&[collection("x9", "other", json!([]))], true, None)
            .unwrap();
        assert_eq!(store.collection_count(), 1);
    }

    #[test]
    fn test_rename_swap_is_order_independent() {
        // Store holds a1 = "users"; one call renames a1 to "jobs" while a
        // new b2 takes over the "users" name. Valid as a set, so it must
        // succeed no matter how the definitions are ordered.
        for flipped in [false, true] {
            let temp_dir = TempDir::new().unwrap();
            let mut store = SchemaStore::open(temp_dir.path()).unwrap();
            store
                .import_collections(&[collection("a1", "users", json!([]))], false, None)
                .unwrap();

            let mut definitions = vec![
                collection("a1", "jobs", json!([])),
                collection("b2", "users", json!([])),
            ];
            if flipped {
                definitions.reverse();
            }

            store.import_collections(&definitions, false, None).unwrap();
            assert_eq!(store.collection("a1").unwrap().name, "jobs");
            assert_eq!(store.collection("b2").unwrap().name, "users");
        }
    }

    #[test]
    fn test_name_held_by_kept_collection_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();
        store
            .import_collections(&[collection("a1", "users", json!([]))], false, None)
            .unwrap();

        // a1 survives the call and keeps its name, so b2 cannot take it.
        let err = store
            .import_collections(&[collection("b2", "users", json!([]))], false, None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
        assert_eq!(store.collection_count(), 1);

        // With delete_missing the old holder goes away and the name is free.
        store
            .import_collections(&[collection("b2", "users", json!([]))], true, None)
            .unwrap();
        assert_eq!(store.collection_by_name("users").unwrap().id, "b2");
    }

    #[test]
    fn test_system_collections_survive_delete_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SchemaStore::open(temp_dir.path()).unwrap();

        let mut system = collection("sys1", "_admins", json!([]));
        system.system = true;
        store
            .import_collections(&[system], false, None)
            .unwrap();

        store
            .import_collections(&[collection("a1", "users", json!([]))], true, None)
            .unwrap();
        assert!(store.collection("sys1").is_some());
    }
}
