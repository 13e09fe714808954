//! # OPAL Core
//!
//! Client-side record model for the OPAL patient list.
//!
//! This crate turns raw backend JSON into typed values:
//! - [`Schema`] of columns and fields, fetched at runtime
//! - [`Patient`] records holding [`Item`]s per column
//! - date conversion for date-typed fields
//! - list filtering and [`PatientOrdering`]
//!
//! **No I/O**: fetching and saving records belongs in `opal-client`.

pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod item;
pub mod ordering;
pub mod patient;
pub mod schema;

pub use error::{ModelError, ModelResult};
pub use item::{FieldValue, Item, RecordId};
pub use ordering::{sort_patients, PatientOrdering};
pub use patient::{Patient, PatientFilter};
pub use schema::{Column, Field, FieldType, Schema};
