//! Patient records.
//!
//! A [`Patient`] is built from a raw backend resource and the [`Schema`] that describes it: every
//! schema column becomes a list of [`Item`]s, every other attribute is kept as raw JSON.

use crate::constants::{
    DEMOGRAPHICS_COLUMN, HOSPITAL_KEY, ID_KEY, LOCATION_COLUMN, NAME_KEY, TAGS_KEY, WARD_KEY,
};
use crate::item::{record_id_from_value, Item, RecordId};
use crate::ordering::PatientOrdering;
use crate::schema::{Column, Schema};
use crate::{ModelError, ModelResult};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One patient with its items, grouped by column.
#[derive(Clone, Debug)]
pub struct Patient {
    id: RecordId,
    attributes: Map<String, Value>,
    columns: BTreeMap<String, Vec<Item>>,
    schema: Arc<Schema>,
}

impl Patient {
    /// Builds a patient from a backend resource.
    ///
    /// # Arguments
    ///
    /// * `resource` - JSON object as returned by `GET /patient/{id}/`.
    /// * `schema` - Schema describing the resource's columns.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` if:
    /// - the resource is not an object or has no integer `id`,
    /// - a schema column is present but not an array,
    /// - an element of a column array is not an object.
    pub fn from_resource(resource: Value, schema: Arc<Schema>) -> ModelResult<Self> {
        let Value::Object(mut attributes) = resource else {
            return Err(ModelError::InvalidPatientResource);
        };

        let id = attributes
            .remove(ID_KEY)
            .map(|value| record_id_from_value(&value))
            .transpose()?
            .flatten()
            .ok_or(ModelError::MissingPatientId)?;

        let patient_name = attributes
            .get(DEMOGRAPHICS_COLUMN)
            .and_then(|demographics| demographics.get(0))
            .and_then(|first| first.get(NAME_KEY))
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut columns = BTreeMap::new();
        for column in schema.columns() {
            let raw = match attributes.remove(&column.name) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(raw)) => raw,
                Some(_) => {
                    return Err(ModelError::InvalidColumnData {
                        column: column.name.clone(),
                    })
                }
            };

            if column.single && raw.len() > 1 {
                tracing::warn!(
                    "patient {} has {} items in singleton column {}",
                    id,
                    raw.len(),
                    column.name
                );
            }

            let items = raw
                .into_iter()
                .enumerate()
                .map(|(index, value)| match value {
                    Value::Object(attrs) => {
                        Item::new(attrs, patient_name.clone(), Arc::clone(column))
                    }
                    _ => Err(ModelError::InvalidItem {
                        column: column.name.clone(),
                        index,
                    }),
                })
                .collect::<ModelResult<Vec<_>>>()?;
            columns.insert(column.name.clone(), items);
        }

        Ok(Self {
            id,
            attributes,
            columns,
            schema,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Raw resource attribute that is not a schema column.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn demographics(&self) -> Option<&Item> {
        self.item(DEMOGRAPHICS_COLUMN, 0)
    }

    pub fn location(&self) -> Option<&Item> {
        self.item(LOCATION_COLUMN, 0)
    }

    pub fn name(&self) -> Option<&str> {
        self.demographics().and_then(|item| item.text(NAME_KEY))
    }

    pub fn item_count(&self, column: &str) -> usize {
        self.items(column).len()
    }

    pub fn items(&self, column: &str) -> &[Item] {
        self.columns.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn item(&self, column: &str, index: usize) -> Option<&Item> {
        self.items(column).get(index)
    }

    /// Creates an empty, unsaved item bound to this patient and the named column.
    ///
    /// The item is not added to the patient; that happens when it is first saved.
    pub fn new_item(&self, column: &str) -> ModelResult<Item> {
        let column = Arc::clone(self.schema.column_by_name(column)?);
        Item::new(Map::new(), self.name().map(str::to_owned), column)
    }

    /// Checks that one more item fits in `column`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::SingletonColumnOccupied` if the column is a singleton that already
    /// holds an item.
    pub fn ensure_room(&self, column: &Column) -> ModelResult<()> {
        if column.single && self.item_count(&column.name) > 0 {
            return Err(ModelError::SingletonColumnOccupied(column.name.clone()));
        }
        Ok(())
    }

    /// Appends an item to the list of its column.
    pub fn add_item(&mut self, item: Item) -> ModelResult<()> {
        self.ensure_room(item.column())?;
        self.columns
            .entry(item.column_name().to_owned())
            .or_default()
            .push(item);
        Ok(())
    }

    /// Replaces the stored item with the same column and id. Returns `false` if there is none.
    pub fn replace_item(&mut self, item: Item) -> bool {
        let Some(items) = self.columns.get_mut(item.column_name()) else {
            return false;
        };
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    /// Removes the first item in the item's column whose id matches. No-op if none matches.
    pub fn remove_item(&mut self, item: &Item) {
        if let Some(items) = self.columns.get_mut(item.column_name()) {
            if let Some(index) = items.iter().position(|existing| existing.id() == item.id()) {
                items.remove(index);
            }
        }
    }

    /// Whether the patient shows up in a list filtered by tag, hospital and ward.
    ///
    /// The current location must carry `tag` set to `true`, and its hospital and ward must
    /// contain the given filters, ignoring case. Empty filters match anything.
    pub fn is_visible(&self, tag: &str, hospital: &str, ward: &str) -> bool {
        let Some(location) = self.location() else {
            return false;
        };

        let tagged = matches!(
            location.value(TAGS_KEY).and_then(|tags| tags.get(tag)),
            Some(Value::Bool(true))
        );

        tagged
            && contains_ignore_case(location.text(HOSPITAL_KEY).unwrap_or(""), hospital)
            && contains_ignore_case(location.text(WARD_KEY).unwrap_or(""), ward)
    }

    /// Display order relative to `other`; see [`PatientOrdering::compare`].
    pub fn compare(&self, other: &Patient, ordering: &PatientOrdering) -> Ordering {
        ordering.compare(self, other)
    }
}

/// List filter for [`Patient::is_visible`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub tag: String,
    pub hospital: String,
    pub ward: String,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        patient.is_visible(&self.tag, &self.hospital, &self.ward)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
