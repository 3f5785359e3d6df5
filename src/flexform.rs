//! Flexform values and their data structures.
//!
//! A flexform value is a tree of sheets → language slots → fields. A field is
//! either a leaf (a slot map whose `vDEF` entry holds the default-language
//! value) or a section of repeated container instances. Everything the engine
//! does not translate, including unknown keys like `_TOGGLE`, is kept as raw
//! JSON so it survives a translation unchanged.

use crate::error::{Error, Result};
use crate::record::{FieldValue, Record};
use crate::schema::ColumnConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Language slot holding the default-language fields of a sheet
pub const DEFAULT_LANGUAGE_KEY: &str = "lDEF";

/// Value slot holding the default-language value of a leaf
pub const DEFAULT_VALUE_KEY: &str = "vDEF";

/// Leaf: value slots (`vDEF`, `vDE`, ...) as raw JSON
pub type FlexValue = IndexMap<String, Value>;

/// Language slot (`lDEF`, ...) → field name → field
pub type FlexSheet = IndexMap<String, IndexMap<String, FlexField>>;

/// Keys keep their input order; section instance order is content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlexFormData {
    pub data: IndexMap<String, FlexSheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexField {
    Section(FlexSection),
    Value(FlexValue),
}

/// Repeatable section: instance key → container name → entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexSection {
    pub el: IndexMap<String, IndexMap<String, SectionEntry>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionEntry {
    Container(FlexContainer),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexContainer {
    pub el: IndexMap<String, FlexValue>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Data structure of a flexform field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexFormSchema {
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSchema {
    #[serde(default)]
    pub elements: BTreeMap<String, FlexElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexElement {
    Section(SectionSchema),
    Field(ColumnConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSchema {
    pub containers: BTreeMap<String, ContainerSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSchema {
    #[serde(default)]
    pub elements: BTreeMap<String, ColumnConfig>,
}

/// Locates and parses the data structure of a flexform field.
///
/// Resolution is split in two steps so callers can cache parsed structures
/// under the identifier.
pub trait FlexFormResolver: Send + Sync {
    fn identifier(&self, table: &str, field: &str, record: &Record) -> Result<String>;

    fn parse(&self, identifier: &str) -> Result<FlexFormSchema>;
}

/// Structures registered up front, keyed by `table.field`.
///
/// A pointer field selects a variant: with pointer `CType` and a record whose
/// `CType` is `news_list`, `tt_content.pi_flexform.news_list` is preferred over
/// `tt_content.pi_flexform`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticFlexForms {
    #[serde(default)]
    pub structures: BTreeMap<String, FlexFormSchema>,
    #[serde(default)]
    pub pointer_fields: BTreeMap<String, String>,
}

impl StaticFlexForms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, key: impl Into<String>, schema: FlexFormSchema) -> Self {
        self.structures.insert(key.into(), schema);
        self
    }

    pub fn with_pointer_field(mut self, table_field: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.pointer_fields.insert(table_field.into(), pointer.into());
        self
    }
}

impl FlexFormResolver for StaticFlexForms {
    fn identifier(&self, table: &str, field: &str, record: &Record) -> Result<String> {
        let base = format!("{}.{}", table, field);

        let variant = self
            .pointer_fields
            .get(&base)
            .and_then(|pointer| record.get(pointer))
            .and_then(FieldValue::as_text)
            .map(|value| format!("{}.{}", base, value));

        if let Some(variant) = variant.filter(|key| self.structures.contains_key(key)) {
            return Ok(variant);
        }
        if self.structures.contains_key(&base) {
            return Ok(base);
        }
        Err(Error::Schema(format!("no data structure for {}", base)))
    }

    fn parse(&self, identifier: &str) -> Result<FlexFormSchema> {
        self.structures
            .get(identifier)
            .cloned()
            .ok_or_else(|| Error::Schema(format!("unknown data structure '{}'", identifier)))
    }
}
