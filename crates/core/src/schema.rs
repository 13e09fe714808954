//! Record schema.
//!
//! The backend describes the shape of every patient record at runtime: an ordered list of
//! columns, each holding a list of typed fields. The schema is fetched once and shared between
//! all patients built from it.

use crate::constants::DATE_FIELD_TYPE;
use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Type of a column field.
///
/// Only dates get special treatment on the client; every other type string is kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Date,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Date => DATE_FIELD_TYPE,
            FieldType::Other(name) => name,
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        if value == DATE_FIELD_TYPE {
            FieldType::Date
        } else {
            FieldType::Other(value.to_owned())
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(FieldType::from(s.as_str()))
    }
}

/// A named, typed field of a column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn is_date(&self) -> bool {
        self.field_type == FieldType::Date
    }
}

/// A named category of patient sub-records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// At most one item per patient.
    #[serde(default)]
    pub single: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Column {
    pub fn date_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_date())
    }

    pub fn is_date_field(&self, name: &str) -> bool {
        self.date_fields().any(|field| field.name == name)
    }
}

/// The ordered set of columns describing every patient record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Arc<Column>>,
}

impl Schema {
    /// Builds a schema from an ordered list of columns.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateColumn` if two columns share a name.
    pub fn new(columns: Vec<Column>) -> ModelResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self {
            columns: columns.into_iter().map(Arc::new).collect(),
        })
    }

    /// Builds a schema from the body of `GET /schema/`.
    pub fn from_json(value: serde_json::Value) -> ModelResult<Self> {
        let columns: Vec<Column> =
            serde_json::from_value(value).map_err(ModelError::SchemaDeserialization)?;
        Self::new(columns)
    }

    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_by_index(&self, index: usize) -> Option<&Arc<Column>> {
        self.columns.get(index)
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ColumnNotFound` if no column has that name.
    pub fn column_by_name(&self, name: &str) -> ModelResult<&Arc<Column>> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_owned()))
    }

    pub fn is_singleton(&self, name: &str) -> ModelResult<bool> {
        Ok(self.column_by_name(name)?.single)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Arc<Column>> {
        self.columns.iter()
    }
}
