use crate::core::{CollectionDefinition, Result, SchemaError};

/// Catalog holds the current set of collection definitions, keyed by id.
///
/// Immutable after construction: mutation methods consume `self` and return
/// a new catalog, so an importer can build the next state on a private copy
/// and swap it in only after every check has passed. `im::HashMap` makes the
/// copies cheap through structural sharing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    collections: im::HashMap<String, CollectionDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collections(collections: Vec<CollectionDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for definition in collections {
            catalog = catalog.upsert(definition)?;
        }
        Ok(catalog)
    }

    /// Insert or replace a collection - returns a NEW catalog.
    ///
    /// Rejects a definition whose name is already taken by a different id;
    /// replacing the definition stored under the same id is allowed.
    pub fn upsert(self, definition: CollectionDefinition) -> Result<Self> {
        if let Some(existing) = self.get_by_name(&definition.name)
            && existing.id != definition.id
        {
            return Err(SchemaError::Validation(format!(
                "Collection name '{}' is already used by '{}'",
                definition.name, existing.id
            )));
        }

        let mut collections = self.collections;
        collections.insert(definition.id.clone(), definition);
        Ok(Self { collections })
    }

    /// Remove a collection - returns a NEW catalog.
    pub fn remove(self, id: &str) -> Result<Self> {
        if !self.collections.contains_key(id) {
            return Err(SchemaError::Validation(format!(
                "Collection '{}' not found",
                id
            )));
        }
        let mut collections = self.collections;
        collections.remove(id);
        Ok(Self { collections })
    }

    pub fn get(&self, id: &str) -> Option<&CollectionDefinition> {
        self.collections.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&CollectionDefinition> {
        self.collections.values().find(|c| c.name == name)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.collections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionDefinition> {
        self.collections.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(|s| s.as_str())
    }

    /// Collections sorted by id, for deterministic snapshots.
    pub fn sorted(&self) -> Vec<CollectionDefinition> {
        let mut collections: Vec<_> = self.collections.values().cloned().collect();
        collections.sort_by(|a, b| a.id.cmp(&b.id));
        collections
    }
}
