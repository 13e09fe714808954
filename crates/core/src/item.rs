//! Patient sub-records.
//!
//! An [`Item`] is one record within a patient column: a diagnosis, a location, a set of
//! demographics. Its fields are only known at runtime from the column definition, so they are
//! held in an open map keyed by field name. Date-typed fields are converted to [`NaiveDate`]
//! values on the way in and back to `YYYY-MM-DD` strings on the way out.

use crate::constants::ID_KEY;
use crate::dates::{format_date, parse_date};
use crate::schema::Column;
use crate::{ModelError, ModelResult};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Backend record identifier for patients and items.
pub type RecordId = i64;

/// Value of a single item field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    Value(Value),
}

impl FieldValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(date) => Some(*date),
            FieldValue::Value(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Value(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(value) => Some(value),
            FieldValue::Date(_) => None,
        }
    }

    /// Wire representation of the value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Date(date) => Value::String(format_date(*date)),
            FieldValue::Value(value) => value.clone(),
        }
    }
}

/// Reads an optional record id from a raw attribute value.
///
/// Integers and integer-valued strings are accepted; `null` means "not saved yet".
pub fn record_id_from_value(value: &Value) -> ModelResult<Option<RecordId>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| ModelError::InvalidRecordId(value.clone())),
        Value::String(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ModelError::InvalidRecordId(value.clone())),
        _ => Err(ModelError::InvalidRecordId(value.clone())),
    }
}

/// One record within a patient column.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    id: Option<RecordId>,
    column: Arc<Column>,
    patient_name: Option<String>,
    fields: BTreeMap<String, FieldValue>,
}

impl Item {
    /// Builds an item from its raw attributes.
    ///
    /// All attributes are kept, including ones the column does not define. Values of date-typed
    /// fields are parsed; see [`parse_date`].
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidRecordId` if `attrs` carries an `id` that is not an integer.
    pub fn new(
        attrs: Map<String, Value>,
        patient_name: Option<String>,
        column: Arc<Column>,
    ) -> ModelResult<Self> {
        let mut item = Self {
            id: None,
            column,
            patient_name,
            fields: BTreeMap::new(),
        };
        item.merge(attrs)?;
        Ok(item)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    pub fn column_name(&self) -> &str {
        &self.column.name
    }

    /// Display name of the owning patient, taken from its demographics when the item was built.
    pub fn patient_name(&self) -> Option<&str> {
        self.patient_name.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(FieldValue::as_date)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_json)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Merges attributes onto the item.
    ///
    /// An `id` key replaces the item's id; date-typed fields are parsed as on construction.
    pub fn merge(&mut self, attrs: Map<String, Value>) -> ModelResult<()> {
        for (key, value) in attrs {
            if key == ID_KEY {
                self.id = record_id_from_value(&value)?;
                continue;
            }

            let value = if self.column.is_date_field(&key) {
                parse_date(value)
            } else {
                FieldValue::Value(value)
            };
            self.fields.insert(key, value);
        }
        Ok(())
    }

    /// Returns an editable copy of the item: its id and every non-date column field.
    ///
    /// Date fields are left out as form inputs cannot hold date values yet.
    pub fn copy_for_edit(&self) -> Map<String, Value> {
        let mut copy = Map::new();
        if let Some(id) = self.id {
            copy.insert(ID_KEY.to_owned(), Value::from(id));
        }

        for field in self.column.fields.iter().filter(|field| !field.is_date()) {
            if let Some(value) = self.fields.get(&field.name) {
                copy.insert(field.name.clone(), value.to_json());
            }
        }

        copy
    }

    /// Wire representation of every attribute held by the item.
    pub fn to_attributes(&self) -> Map<String, Value> {
        let mut attrs: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        if let Some(id) = self.id {
            attrs.insert(ID_KEY.to_owned(), Value::from(id));
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use serde_json::json;

    fn diagnosis_column() -> Arc<Column> {
        Arc::new(Column {
            name: "diagnosis".into(),
            single: false,
            fields: vec![
                Field {
                    name: "condition".into(),
                    field_type: FieldType::Other("string".into()),
                },
                Field {
                    name: "provisional".into(),
                    field_type: FieldType::Other("boolean".into()),
                },
                Field {
                    name: "date_of_diagnosis".into(),
                    field_type: FieldType::Date,
                },
            ],
        })
    }

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_new_parses_date_fields() {
        let item = Item::new(
            attrs(json!({
                "id": 4,
                "condition": "Pneumonia",
                "date_of_diagnosis": "2020-03-05"
            })),
            Some("Jane Doe".into()),
            diagnosis_column(),
        )
        .unwrap();

        assert_eq!(item.id(), Some(4));
        assert_eq!(item.column_name(), "diagnosis");
        assert_eq!(item.patient_name(), Some("Jane Doe"));
        assert_eq!(item.text("condition"), Some("Pneumonia"));
        assert_eq!(
            item.date("date_of_diagnosis"),
            NaiveDate::from_ymd_opt(2020, 3, 5)
        );
    }

    #[test]
    fn test_new_passes_non_string_dates_through() {
        let item = Item::new(
            attrs(json!({"date_of_diagnosis": null})),
            None,
            diagnosis_column(),
        )
        .unwrap();

        assert_eq!(
            item.get("date_of_diagnosis"),
            Some(&FieldValue::Value(Value::Null))
        );
        assert!(!item.is_saved());
    }

    #[test]
    fn test_new_keeps_attributes_outside_schema() {
        let item = Item::new(
            attrs(json!({"episode_id": 12, "condition": "Flu"})),
            None,
            diagnosis_column(),
        )
        .unwrap();
        assert_eq!(item.value("episode_id"), Some(&json!(12)));
    }

    #[test]
    fn test_new_rejects_non_integer_id() {
        let err = Item::new(attrs(json!({"id": [1]})), None, diagnosis_column())
            .expect_err("array id must fail");
        assert!(matches!(err, ModelError::InvalidRecordId(_)));
    }

    #[test]
    fn test_record_id_accepts_numeric_strings() {
        assert_eq!(record_id_from_value(&json!("42")).unwrap(), Some(42));
        assert_eq!(record_id_from_value(&json!(null)).unwrap(), None);
        assert!(record_id_from_value(&json!("forty-two")).is_err());
        assert!(record_id_from_value(&json!(1.5)).is_err());
    }

    #[test]
    fn test_copy_for_edit_excludes_date_fields() {
        let item = Item::new(
            attrs(json!({
                "id": 9,
                "condition": "Malaria",
                "provisional": true,
                "date_of_diagnosis": "2019-12-31",
                "episode_id": 3
            })),
            None,
            diagnosis_column(),
        )
        .unwrap();

        let copy = item.copy_for_edit();
        assert_eq!(
            Value::Object(copy.clone()),
            json!({"id": 9, "condition": "Malaria", "provisional": true})
        );
        assert!(!copy.contains_key("date_of_diagnosis"));
    }

    #[test]
    fn test_copy_for_edit_of_unsaved_item_has_no_id() {
        let item = Item::new(Map::new(), None, diagnosis_column()).unwrap();
        assert!(item.copy_for_edit().is_empty());
    }

    #[test]
    fn test_merge_updates_id_and_parses_dates() {
        let mut item = Item::new(Map::new(), None, diagnosis_column()).unwrap();
        item.merge(attrs(json!({
            "id": 15,
            "condition": "Dengue",
            "date_of_diagnosis": "2021-01-02"
        })))
        .unwrap();

        assert_eq!(item.id(), Some(15));
        assert_eq!(item.text("condition"), Some("Dengue"));
        assert_eq!(
            item.date("date_of_diagnosis"),
            NaiveDate::from_ymd_opt(2021, 1, 2)
        );
    }

    #[test]
    fn test_to_attributes_formats_dates() {
        let item = Item::new(
            attrs(json!({"id": 2, "date_of_diagnosis": "2020-03-05", "condition": "TB"})),
            None,
            diagnosis_column(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(item.to_attributes()),
            json!({"id": 2, "date_of_diagnosis": "2020-03-05", "condition": "TB"})
        );
    }
}
