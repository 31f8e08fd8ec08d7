use crate::core::field::FieldDefinition;
use crate::core::{Result, SchemaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Distinguishes plain data collections from auth and view collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Base,
    Auth,
    View,
}

/// One logical table/collection in the platform wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub id: String,
    #[serde(with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    #[serde(default)]
    pub system: bool,
    pub schema: Vec<FieldDefinition>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(rename = "listRule")]
    pub list_rule: Option<String>,
    #[serde(rename = "viewRule")]
    pub view_rule: Option<String>,
    #[serde(rename = "createRule")]
    pub create_rule: Option<String>,
    #[serde(rename = "updateRule")]
    pub update_rule: Option<String>,
    #[serde(rename = "deleteRule")]
    pub delete_rule: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl CollectionDefinition {
    /// Builds a typed definition from a JSON literal record.
    ///
    /// Pure parse + validate: any structurally invalid record surfaces
    /// `SchemaError::Validation` instead of panicking downstream.
    pub fn from_literal(literal: serde_json::Value) -> Result<Self> {
        let definition: CollectionDefinition = serde_json::from_value(literal)
            .map_err(|e| SchemaError::Validation(format!("Malformed collection record: {}", e)))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Intra-collection checks: non-empty id/name, unique field ids and
    /// names, well-formed field options. Relation targets are resolved
    /// later by the importer, against the whole snapshot plus the store.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Collection '{}' has an empty id",
                self.name
            )));
        }
        if self.name.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Collection '{}' has an empty name",
                self.id
            )));
        }

        let mut field_ids = HashSet::new();
        let mut field_names = HashSet::new();
        for field in &self.schema {
            field.validate()?;
            if !field_ids.insert(field.id.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Collection '{}' has a duplicate field id '{}'",
                    self.name, field.id
                )));
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Collection '{}' has a duplicate field name '{}'",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }

    /// Ids of all collections referenced by relation fields.
    pub fn relation_targets(&self) -> impl Iterator<Item = &str> {
        self.schema.iter().filter_map(|f| f.relation_target())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.schema.iter().find(|f| f.name == name)
    }
}

/// Serde adapter for the platform timestamp format
/// (`2024-11-29 11:45:22.881Z` — space-separated, trailing `Z`).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.fZ")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
