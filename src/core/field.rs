use crate::core::{Result, SchemaError};
use serde::{Deserialize, Serialize};

/// One column within a collection, in the platform wire format:
/// flat `system`/`id`/`name`/flags keys plus a `type` tag and a
/// type-specific `options` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub system: bool,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub presentable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(flatten)]
    pub options: FieldOptions,
}

impl FieldDefinition {
    /// Wire name of the field type ("relation", "file", ...).
    pub fn type_name(&self) -> &'static str {
        self.options.type_name()
    }

    /// The collection id this field points at, if it is a relation.
    pub fn relation_target(&self) -> Option<&str> {
        match &self.options {
            FieldOptions::Relation(opts) => Some(&opts.collection_id),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Field '{}' has an empty id",
                self.name
            )));
        }
        if self.name.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Field '{}' has an empty name",
                self.id
            )));
        }
        self.options.validate(&self.name)
    }
}

/// Type tag plus the matching options record.
///
/// Adjacent tagging reproduces the wire layout exactly:
/// `{"type": "relation", "options": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum FieldOptions {
    Relation(RelationOptions),
    File(FileOptions),
    Text(TextOptions),
    Number(NumberOptions),
    Bool(BoolOptions),
    Email(DomainOptions),
    Url(DomainOptions),
    Date(DateOptions),
    Select(SelectOptions),
    Json(JsonOptions),
    Editor(EditorOptions),
}

impl FieldOptions {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldOptions::Relation(_) => "relation",
            FieldOptions::File(_) => "file",
            FieldOptions::Text(_) => "text",
            FieldOptions::Number(_) => "number",
            FieldOptions::Bool(_) => "bool",
            FieldOptions::Email(_) => "email",
            FieldOptions::Url(_) => "url",
            FieldOptions::Date(_) => "date",
            FieldOptions::Select(_) => "select",
            FieldOptions::Json(_) => "json",
            FieldOptions::Editor(_) => "editor",
        }
    }

    fn validate(&self, field_name: &str) -> Result<()> {
        match self {
            FieldOptions::Relation(opts) => opts.validate(field_name),
            FieldOptions::File(opts) => opts.validate(field_name),
            FieldOptions::Text(opts) => opts.validate(field_name),
            FieldOptions::Number(opts) => opts.validate(field_name),
            FieldOptions::Select(opts) => opts.validate(field_name),
            FieldOptions::Json(opts) => opts.validate(field_name),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOptions {
    pub collection_id: String,
    #[serde(default)]
    pub cascade_delete: bool,
    #[serde(default)]
    pub min_select: Option<u32>,
    #[serde(default)]
    pub max_select: Option<u32>,
    #[serde(default)]
    pub display_fields: Option<Vec<String>>,
}

impl RelationOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if self.collection_id.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Relation field '{}' has an empty collection id",
                field_name
            )));
        }
        if let Some(max) = self.max_select {
            if max == 0 {
                return Err(SchemaError::Validation(format!(
                    "Relation field '{}' has maxSelect 0",
                    field_name
                )));
            }
            if let Some(min) = self.min_select
                && min > max
            {
                return Err(SchemaError::Validation(format!(
                    "Relation field '{}' has minSelect {} > maxSelect {}",
                    field_name, min, max
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    #[serde(default)]
    pub mime_types: Vec<String>,
    #[serde(default)]
    pub thumbs: Vec<String>,
    pub max_select: u32,
    pub max_size: i64,
    #[serde(default)]
    pub protected: bool,
}

impl FileOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if self.max_size <= 0 {
            return Err(SchemaError::Validation(format!(
                "File field '{}' has a non-positive maxSize {}",
                field_name, self.max_size
            )));
        }
        if self.max_select == 0 {
            return Err(SchemaError::Validation(format!(
                "File field '{}' has maxSelect 0",
                field_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextOptions {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
    #[serde(default)]
    pub pattern: String,
}

impl TextOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(SchemaError::Validation(format!(
                "Text field '{}' has min {} > max {}",
                field_name, min, max
            )));
        }
        if !self.pattern.is_empty()
            && let Err(err) = regex::Regex::new(&self.pattern)
        {
            return Err(SchemaError::Validation(format!(
                "Text field '{}' has an invalid pattern: {}",
                field_name, err
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NumberOptions {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub no_decimal: bool,
}

impl NumberOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(SchemaError::Validation(format!(
                "Number field '{}' has min {} > max {}",
                field_name, min, max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoolOptions {}

/// Shared shape of email and url options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DomainOptions {
    #[serde(default)]
    pub except_domains: Option<Vec<String>>,
    #[serde(default)]
    pub only_domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DateOptions {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    pub max_select: u32,
    pub values: Vec<String>,
}

impl SelectOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if self.values.is_empty() {
            return Err(SchemaError::Validation(format!(
                "Select field '{}' has no values",
                field_name
            )));
        }
        if self.max_select == 0 {
            return Err(SchemaError::Validation(format!(
                "Select field '{}' has maxSelect 0",
                field_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOptions {
    pub max_size: i64,
}

impl JsonOptions {
    fn validate(&self, field_name: &str) -> Result<()> {
        if self.max_size <= 0 {
            return Err(SchemaError::Validation(format!(
                "Json field '{}' has a non-positive maxSize {}",
                field_name, self.max_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    #[serde(default)]
    pub convert_urls: bool,
}
