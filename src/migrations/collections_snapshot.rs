//! Built-in migration: the media-pipeline collections snapshot.
//!
//! Declares the `circle_jobs` and `face_jobs` pipeline job collections and
//! the `users` profile collection, then brings the store to exactly that
//! state in one import (`delete_missing = true`).

use super::runner::Migration;
use crate::core::{CollectionDefinition, Result};
use crate::storage::SchemaStore;
use serde_json::json;

pub struct CollectionsSnapshot;

impl CollectionsSnapshot {
    /// The three collection definitions, as wire-format literals.
    pub fn definitions() -> Result<Vec<CollectionDefinition>> {
        let literals = vec![
            json!({
                "id": "2dtkk2h5xo817br",
                "created": "2024-11-29 11:45:22.881Z",
                "updated": "2024-11-29 11:45:22.881Z",
                "name": "circle_jobs",
                "type": "base",
                "system": false,
                "schema": [
                    {
                        "system": false,
                        "id": "uzfarnhf",
                        "name": "owner",
                        "type": "relation",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "collectionId": "ojssopdqy5r541p",
                            "cascadeDelete": false,
                            "minSelect": null,
                            "maxSelect": 1,
                            "displayFields": null
                        }
                    },
                    {
                        "system": false,
                        "id": "gvtrqemw",
                        "name": "input_media",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "reycy6gk",
                        "name": "output_media",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "zi4rfipy",
                        "name": "status",
                        "type": "text",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "pattern": ""
                        }
                    }
                ],
                "indexes": [],
                "listRule": null,
                "viewRule": null,
                "createRule": null,
                "updateRule": null,
                "deleteRule": null,
                "options": {}
            }),
            json!({
                "id": "9r47cxfzaoclhq6",
                "created": "2024-11-29 11:45:22.882Z",
                "updated": "2024-11-29 11:45:22.882Z",
                "name": "face_jobs",
                "type": "base",
                "system": false,
                "schema": [
                    {
                        "system": false,
                        "id": "qp8ofgdk",
                        "name": "owner",
                        "type": "relation",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "collectionId": "ojssopdqy5r541p",
                            "cascadeDelete": false,
                            "minSelect": null,
                            "maxSelect": 1,
                            "displayFields": null
                        }
                    },
                    {
                        "system": false,
                        "id": "vzonmr2d",
                        "name": "input_face",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "zr1yy9v0",
                        "name": "input_media",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "oavl1xr2",
                        "name": "media_transformed",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "vjpc4htl",
                        "name": "output_media",
                        "type": "file",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "mimeTypes": [],
                            "thumbs": [],
                            "maxSelect": 1,
                            "maxSize": 524288000,
                            "protected": false
                        }
                    },
                    {
                        "system": false,
                        "id": "db4eyjzd",
                        "name": "status",
                        "type": "text",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "pattern": ""
                        }
                    }
                ],
                "indexes": [],
                "listRule": null,
                "viewRule": null,
                "createRule": null,
                "updateRule": null,
                "deleteRule": null,
                "options": {}
            }),
            json!({
                "id": "ojssopdqy5r541p",
                "created": "2024-11-29 11:45:22.882Z",
                "updated": "2024-11-29 11:45:22.882Z",
                "name": "users",
                "type": "base",
                "system": false,
                "schema": [
                    {
                        "system": false,
                        "id": "vqlz3wsv",
                        "name": "tgid",
                        "type": "number",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "noDecimal": false
                        }
                    },
                    {
                        "system": false,
                        "id": "tekw5iqf",
                        "name": "username",
                        "type": "text",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "pattern": ""
                        }
                    },
                    {
                        "system": false,
                        "id": "yinpouxs",
                        "name": "circle_count",
                        "type": "number",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "noDecimal": false
                        }
                    },
                    {
                        "system": false,
                        "id": "dths5bgp",
                        "name": "face_replace_count",
                        "type": "number",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "noDecimal": false
                        }
                    },
                    {
                        "system": false,
                        "id": "bb3yst5x",
                        "name": "coins",
                        "type": "number",
                        "required": false,
                        "presentable": false,
                        "unique": false,
                        "options": {
                            "min": null,
                            "max": null,
                            "noDecimal": false
                        }
                    }
                ],
                "indexes": [],
                "listRule": null,
                "viewRule": null,
                "createRule": null,
                "updateRule": null,
                "deleteRule": null,
                "options": {}
            }),
        ];

        literals
            .into_iter()
            .map(CollectionDefinition::from_literal)
            .collect()
    }
}

impl Migration for CollectionsSnapshot {
    fn name(&self) -> &str {
        "1732880722_collections_snapshot"
    }

    fn up(&self, store: &mut SchemaStore) -> Result<()> {
        let definitions = Self::definitions()?;
        store.import_collections(&definitions, true, Some("collections snapshot"))?;
        Ok(())
    }

    // Schema rollback for this snapshot is intentionally not implemented;
    // reverting is a no-op that always succeeds.
    fn down(&self, _store: &mut SchemaStore) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_parse() {
        let definitions = CollectionsSnapshot::definitions().unwrap();
        assert_eq!(definitions.len(), 3);

        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["circle_jobs", "face_jobs", "users"]);
    }

    #[test]
    fn test_owner_relations_target_users() {
        let definitions = CollectionsSnapshot::definitions().unwrap();
        for name in ["circle_jobs", "face_jobs"] {
            let jobs = definitions.iter().find(|d| d.name == name).unwrap();
            let owner = jobs.field("owner").unwrap();
            assert_eq!(owner.relation_target(), Some("ojssopdqy5r541p"));
        }
    }
}
