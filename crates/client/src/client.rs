//! Loaders and item persistence.
//!
//! [`OpalClient`] fetches the schema, options and patients and writes items back. The schema is
//! fetched once per client and shared by every patient built afterwards.

use crate::transport::Transport;
use crate::{ClientError, ClientResult};
use opal_core::constants::{ID_KEY, PATIENT_ID_KEY};
use opal_core::item::record_id_from_value;
use opal_core::{Item, Patient, RecordId, Schema};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const SCHEMA_PATH: &str = "/schema/";
pub const OPTIONS_PATH: &str = "/options/";
pub const PATIENTS_PATH: &str = "/patient/";

pub fn patient_path(id: RecordId) -> String {
    format!("/patient/{id}/")
}

pub fn column_path(column: &str) -> String {
    format!("/patient/{column}/")
}

pub fn item_path(column: &str, id: RecordId) -> String {
    format!("/patient/{column}/{id}/")
}

/// Client for the OPAL patient API.
pub struct OpalClient<T> {
    transport: T,
    schema: OnceCell<Arc<Schema>>,
    options: OnceCell<Value>,
}

impl<T: Transport> OpalClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            schema: OnceCell::new(),
            options: OnceCell::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches the record schema from `GET /schema/`.
    ///
    /// The first successful result is kept and returned by every later call. A failed fetch is
    /// not kept, so the next call tries again.
    pub async fn load_schema(&self) -> ClientResult<Arc<Schema>> {
        let schema = self
            .schema
            .get_or_try_init(|| async {
                let body = self.transport.send(Method::GET, SCHEMA_PATH, None).await?;
                let schema = Schema::from_json(body)?;
                tracing::debug!("loaded schema with {} columns", schema.number_of_columns());
                Ok::<_, ClientError>(Arc::new(schema))
            })
            .await?;
        Ok(Arc::clone(schema))
    }

    /// Fetches the options payload from `GET /options/`. Kept like the schema.
    pub async fn load_options(&self) -> ClientResult<Value> {
        let options = self
            .options
            .get_or_try_init(|| self.transport.send(Method::GET, OPTIONS_PATH, None))
            .await?;
        Ok(options.clone())
    }

    /// Fetches every patient from `GET /patient/`.
    pub async fn load_patients(&self) -> ClientResult<Vec<Patient>> {
        let schema = self.load_schema().await?;
        let body = self.transport.send(Method::GET, PATIENTS_PATH, None).await?;

        let Value::Array(resources) = body else {
            return Err(ClientError::UnexpectedResponse {
                path: PATIENTS_PATH.to_owned(),
                expected: "an array of patients",
            });
        };

        let patients = resources
            .into_iter()
            .map(|resource| Patient::from_resource(resource, Arc::clone(&schema)))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("loaded {} patients", patients.len());
        Ok(patients)
    }

    /// Fetches one patient from `GET /patient/{id}/`.
    pub async fn load_patient(&self, id: RecordId) -> ClientResult<Patient> {
        let schema = self.load_schema().await?;
        let body = self
            .transport
            .send(Method::GET, &patient_path(id), None)
            .await?;
        Ok(Patient::from_resource(body, schema)?)
    }

    /// Saves an item of `patient` with the given attributes.
    ///
    /// A saved item (one with an id) is updated with `PUT /patient/{column}/{id}/`, using the id
    /// in `attrs` when present. An unsaved item is created with `POST /patient/{column}/`, with
    /// `patient_id` added to `attrs`.
    ///
    /// On success `attrs` are merged onto the item. An updated item replaces the stored copy with
    /// the same id. A created item is added to `patient`; unless `attrs` supplied an id it takes
    /// one from the response, see [`created_item_id`]. When no id can be read from the response
    /// the item is still added, unsaved, and a warning is logged; reload the patient to pick up
    /// its id.
    ///
    /// # Errors
    ///
    /// Returns a `ClientError` if the attributes cannot be merged or the request fails. Both
    /// checks, and the check for an occupied singleton column, happen before any request is sent,
    /// so an error means the backend was not changed or rejected the change. `patient` is left
    /// unchanged on failure.
    pub async fn save_item(
        &self,
        patient: &mut Patient,
        item: Item,
        mut attrs: Map<String, Value>,
    ) -> ClientResult<()> {
        let column = item.column_name().to_owned();
        let created = !item.is_saved();

        let (method, path) = match item.id() {
            Some(item_id) => {
                let id = match attrs.get(ID_KEY) {
                    Some(value) => record_id_from_value(value)?.unwrap_or(item_id),
                    None => item_id,
                };
                (Method::PUT, item_path(&column, id))
            }
            None => {
                patient.ensure_room(item.column())?;
                attrs.insert(PATIENT_ID_KEY.to_owned(), Value::from(patient.id()));
                (Method::POST, column_path(&column))
            }
        };

        let body = Value::Object(attrs.clone());
        let mut saved = item;
        saved.merge(attrs)?;

        let response = self.transport.send(method, &path, Some(&body)).await?;

        if created {
            if !saved.is_saved() {
                saved.set_id(created_item_id(&response, &column, patient));
            }
            match saved.id() {
                Some(id) => tracing::info!(
                    "created {} item {} for patient {}",
                    column,
                    id,
                    patient.id()
                ),
                None => tracing::warn!(
                    "created {} item for patient {} but the response carried no item id",
                    column,
                    patient.id()
                ),
            }
            patient.add_item(saved)?;
        } else {
            tracing::info!(
                "updated {} item {:?} for patient {}",
                column,
                saved.id(),
                patient.id()
            );
            if !patient.replace_item(saved) {
                tracing::warn!(
                    "updated {} item is not held by patient {}",
                    column,
                    patient.id()
                );
            }
        }

        Ok(())
    }

    /// Deletes a saved item with `DELETE /patient/{column}/{id}/` and removes it from `patient`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnsavedItem` for an item without an id, or a `ClientError` if the
    /// request fails, in which case `patient` is left unchanged.
    pub async fn destroy_item(&self, patient: &mut Patient, item: &Item) -> ClientResult<()> {
        let id = item
            .id()
            .ok_or_else(|| ClientError::UnsavedItem(item.column_name().to_owned()))?;

        self.transport
            .send(Method::DELETE, &item_path(item.column_name(), id), None)
            .await?;

        patient.remove_item(item);
        tracing::info!(
            "deleted {} item {} for patient {}",
            item.column_name(),
            id,
            patient.id()
        );
        Ok(())
    }
}

/// Reads the id of a newly created `column` item from a create response.
///
/// Two response shapes are understood. A record response (`{"id": 21, ...}`) carries the new id
/// directly. A patient response holds the column's items under the column name; the new item is
/// the one id the patient does not hold yet. Its top-level `id` belongs to the patient and is
/// never used. Anything else, including an unreadable id, gives `None`.
pub fn created_item_id(response: &Value, column: &str, patient: &Patient) -> Option<RecordId> {
    let readable = |value: &Value| record_id_from_value(value).ok().flatten();

    match response.get(column) {
        Some(Value::Array(items)) => {
            let mut new_ids = items
                .iter()
                .filter_map(|item| item.get(ID_KEY).and_then(readable))
                .filter(|id| patient.items(column).iter().all(|held| held.id() != Some(*id)));
            match (new_ids.next(), new_ids.next()) {
                (Some(id), None) => Some(id),
                _ => None,
            }
        }
        Some(_) => None,
        None => response.get(ID_KEY).and_then(readable),
    }
}
