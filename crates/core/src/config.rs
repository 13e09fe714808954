//! Core runtime configuration.
//!
//! Display ordering is resolved once at process startup and then passed into whatever lists
//! patients. These helpers take raw values rather than reading the environment themselves, so
//! callers decide where values come from and tests never touch process-wide state.

use crate::ordering::PatientOrdering;
use crate::{ModelError, ModelResult};

/// Build the patient list ordering from optional comma-separated values.
///
/// `None` or empty/whitespace values fall back to the defaults of [`PatientOrdering`].
///
/// # Arguments
///
/// * `categories` - Category names in display order, e.g. `"Inpatient,Review"`.
/// * `numeric_ward_hospitals` - Hospitals whose `T<n>` wards sort numerically.
///
/// # Errors
///
/// Returns `ModelError::InvalidInput` if the category list repeats a name.
pub fn patient_ordering_from_env_values(
    categories: Option<String>,
    numeric_ward_hospitals: Option<String>,
) -> ModelResult<PatientOrdering> {
    let defaults = PatientOrdering::default();

    let categories = match split_list(categories) {
        Some(categories) => {
            for (ix, category) in categories.iter().enumerate() {
                if categories[..ix].contains(category) {
                    return Err(ModelError::InvalidInput(format!(
                        "category listed twice: {category}"
                    )));
                }
            }
            categories
        }
        None => defaults.categories().to_vec(),
    };

    let numeric_ward_hospitals = split_list(numeric_ward_hospitals)
        .unwrap_or_else(|| defaults.numeric_ward_hospitals().to_vec());

    Ok(PatientOrdering::new(categories, numeric_ward_hospitals))
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}
