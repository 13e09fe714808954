//! # OPAL Client
//!
//! Data access for the OPAL patient list over the backend REST API.
//!
//! - [`OpalClient`] loads the schema, options and patients, and saves or deletes items
//! - [`Transport`] is the request seam; [`HttpTransport`] is the `reqwest` implementation
//! - [`ClientConfig`] holds connection settings resolved at startup
//!
//! Every operation returns a [`ClientResult`]; failures are left to the caller to report.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::OpalClient;
pub use config::{timeout_from_env_value, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use transport::{HttpTransport, Transport};
