//! Constants used throughout the OPAL core crate.
//!
//! Well-known column names, attribute keys and the default display ordering live here so the
//! model, the client and the CLI agree on them.

/// Column holding the patient's demographic details (singleton).
pub const DEMOGRAPHICS_COLUMN: &str = "demographics";

/// Column holding the patient's current location (singleton).
pub const LOCATION_COLUMN: &str = "location";

/// Attribute key for record identifiers.
pub const ID_KEY: &str = "id";

/// Attribute key linking a newly created item to its patient.
pub const PATIENT_ID_KEY: &str = "patient_id";

/// Demographics attribute carrying the patient's display name.
pub const NAME_KEY: &str = "name";

/// Location attribute keys.
pub const CATEGORY_KEY: &str = "category";
pub const HOSPITAL_KEY: &str = "hospital";
pub const WARD_KEY: &str = "ward";
pub const BED_KEY: &str = "bed";
pub const TAGS_KEY: &str = "tags";

/// Field type string marking a date-valued field.
pub const DATE_FIELD_TYPE: &str = "date";

/// Default ordering of location categories in the patient list.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Inpatient",
    "Review",
    "Followup",
    "Transferred",
    "Discharged",
    "Deceased",
];

/// Hospitals whose `T<n>` ward names sort numerically by default.
pub const DEFAULT_NUMERIC_WARD_HOSPITALS: [&str; 1] = ["UCH"];
