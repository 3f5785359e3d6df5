//! Per-table field metadata: which columns exist, in which order, and how they
//! are configured for editing and translation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Field type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text input
    Input,
    /// Multi-line text, optionally rich text
    Text,
    /// Structured flexform container
    Flex,
    /// URL segment derived from other fields
    Slug,
    #[serde(other)]
    Other,
}

/// One entry of a slug's `fields` list: a field name, or alternatives where
/// the first non-empty value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlugFieldGroup {
    Field(String),
    FirstOf(Vec<String>),
}

impl SlugFieldGroup {
    pub fn names(&self) -> Vec<&str> {
        match self {
            SlugFieldGroup::Field(name) => vec![name.as_str()],
            SlugFieldGroup::FirstOf(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugOptions {
    #[serde(default)]
    pub fields: Vec<SlugFieldGroup>,
    #[serde(default)]
    pub field_separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub render_type: Option<String>,
    /// Comma-separated evaluation rules, e.g. "trim,int"
    #[serde(default)]
    pub eval: Option<String>,
    #[serde(default)]
    pub softref: Option<String>,
    #[serde(default)]
    pub value_picker: bool,
    #[serde(default)]
    pub enable_richtext: bool,
    #[serde(default)]
    pub generator_options: Option<SlugOptions>,
}

impl FieldConfig {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            render_type: None,
            eval: None,
            softref: None,
            value_picker: false,
            enable_richtext: false,
            generator_options: None,
        }
    }

    /// Any render mode other than the default editor
    pub fn has_custom_render_type(&self) -> bool {
        self.render_type
            .as_deref()
            .is_some_and(|render| !render.is_empty() && render != "default")
    }

    pub fn is_rich_text(&self) -> bool {
        self.field_type == FieldType::Text && self.enable_richtext
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Explicit opt-out: `Some(false)` never translates the field
    #[serde(default)]
    pub translate: Option<bool>,
    /// "exclude" keeps the default-language value in all translations
    #[serde(default)]
    pub l10n_mode: Option<String>,
    pub config: FieldConfig,
}

impl ColumnConfig {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            translate: None,
            l10n_mode: None,
            config,
        }
    }

    pub fn is_language_excluded(&self) -> bool {
        self.l10n_mode.as_deref() == Some("exclude")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(flatten)]
    pub column: ColumnConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCtrl {
    /// Column holding the record's language id
    #[serde(default)]
    pub language_field: Option<String>,
    /// Column pointing at the default-language parent record
    #[serde(default)]
    pub trans_orig_pointer_field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub ctrl: TableCtrl,
    /// Columns in declared order
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.column)
    }

    /// Language and parent pointer columns are never translated
    pub fn is_control_column(&self, name: &str) -> bool {
        self.ctrl.language_field.as_deref() == Some(name)
            || self.ctrl.trans_orig_pointer_field.as_deref() == Some(name)
    }
}

/// Immutable schema for all tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    #[serde(default)]
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Schema(format!(
                "invalid schema file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Override a column's explicit opt-out flag so it is never translated
    pub fn disable_translation(mut self, table: &str, field: &str) -> Self {
        if let Some(column) = self
            .tables
            .get_mut(table)
            .and_then(|schema| schema.columns.iter_mut().find(|c| c.name == field))
        {
            column.column.translate = Some(false);
        }
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }
}
