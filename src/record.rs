use crate::flexform::FlexFormData;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A field value as stored in a record.
///
/// Serializes as plain JSON: `null`, booleans, numbers, strings, or a flexform
/// object (`{"data": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    FlexForm(FlexFormData),
}

impl FieldValue {
    /// Null, empty text or a flexform without sheets
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::FlexForm(data) => data.data.is_empty(),
            FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Float(_) => false,
        }
    }

    /// Scalar value as text; `None` for null and flexform values
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(text) => Some(Cow::Borrowed(text)),
            FieldValue::Int(value) => Some(Cow::Owned(value.to_string())),
            FieldValue::Float(value) => Some(Cow::Owned(value.to_string())),
            FieldValue::Bool(value) => Some(Cow::Borrowed(if *value { "1" } else { "0" })),
            FieldValue::Null | FieldValue::FlexForm(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse().ok(),
            FieldValue::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<FlexFormData> for FieldValue {
    fn from(value: FlexFormData) -> Self {
        FieldValue::FlexForm(value)
    }
}

/// One database row: primary key, parent page id and named field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub uid: u64,
    pub pid: u64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(uid: u64, pid: u64) -> Self {
        Self {
            uid,
            pid,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Copy of this record with `changes` applied on top
    pub fn merged_with(&self, changes: &BTreeMap<String, FieldValue>) -> Record {
        let mut merged = self.clone();
        for (name, value) in changes {
            merged.fields.insert(name.clone(), value.clone());
        }
        merged
    }
}
