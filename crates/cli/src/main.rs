//! Command line front end for the OPAL patient list.
//!
//! Configuration is read once at startup from the environment (and a `.env` file if present):
//! - `OPAL_BASE_URL`: backend address (default: "http://localhost:8000")
//! - `OPAL_HTTP_TIMEOUT_SECS`: per-request timeout in seconds (default: 30)
//! - `OPAL_CATEGORIES`: comma-separated category order for `list`
//! - `OPAL_NUMERIC_WARD_HOSPITALS`: comma-separated hospitals whose `T<n>` wards sort numerically
//! - `RUST_LOG`: log filter (default: "opal=info")

use anyhow::Context;
use clap::{Parser, Subcommand};
use opal_client::{timeout_from_env_value, ClientConfig, HttpTransport, OpalClient};
use opal_core::config::patient_ordering_from_env_values;
use opal_core::{FieldValue, Item, Patient, PatientFilter, PatientOrdering, RecordId};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "opal")]
#[command(about = "OPAL patient list client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the record schema
    Schema,
    /// Show the options payload
    Options,
    /// List patients in display order
    List {
        /// Only patients whose location carries this tag
        #[arg(long)]
        tag: Option<String>,
        /// Hospital filter, applied with --tag (case-insensitive substring)
        #[arg(long, default_value = "")]
        hospital: String,
        /// Ward filter, applied with --tag (case-insensitive substring)
        #[arg(long, default_value = "")]
        ward: String,
    },
    /// Show every item of one patient
    Show {
        /// Patient id
        id: RecordId,
    },
    /// Create an item
    Add {
        /// Patient id
        patient_id: RecordId,
        /// Column name
        column: String,
        /// Field values (key=value)
        values: Vec<String>,
    },
    /// Update an item
    Update {
        /// Patient id
        patient_id: RecordId,
        /// Column name
        column: String,
        /// Item id
        item_id: RecordId,
        /// Field values (key=value)
        values: Vec<String>,
    },
    /// Delete an item
    Delete {
        /// Patient id
        patient_id: RecordId,
        /// Column name
        column: String,
        /// Item id
        item_id: RecordId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("opal=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let base_url = std::env::var("OPAL_BASE_URL")
        .unwrap_or_else(|_| opal_client::config::DEFAULT_BASE_URL.into());
    let timeout = timeout_from_env_value(std::env::var("OPAL_HTTP_TIMEOUT_SECS").ok())?;
    let cfg = ClientConfig::new(base_url, timeout)?;
    let ordering = patient_ordering_from_env_values(
        std::env::var("OPAL_CATEGORIES").ok(),
        std::env::var("OPAL_NUMERIC_WARD_HOSPITALS").ok(),
    )?;

    tracing::debug!("using OPAL backend at {}", cfg.base_url());
    let client = OpalClient::new(HttpTransport::new(&cfg)?);

    match cli.command {
        Some(Commands::Schema) => {
            let schema = client.load_schema().await?;
            for column in schema.columns() {
                let single = if column.single { " (single)" } else { "" };
                println!("{}{}", column.name, single);
                for field in &column.fields {
                    println!("  {}: {}", field.name, field.field_type.as_str());
                }
            }
        }
        Some(Commands::Options) => {
            let options = client.load_options().await?;
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        Some(Commands::List {
            tag,
            hospital,
            ward,
        }) => {
            let mut patients = client.load_patients().await?;
            if let Some(tag) = tag {
                let filter = PatientFilter {
                    tag,
                    hospital,
                    ward,
                };
                patients.retain(|patient| filter.matches(patient));
            }
            ordering.sort(&mut patients);
            print_patient_list(&patients, &ordering);
        }
        Some(Commands::Show { id }) => {
            let patient = client.load_patient(id).await?;
            print_patient(&patient);
        }
        Some(Commands::Add {
            patient_id,
            column,
            values,
        }) => {
            let mut patient = client.load_patient(patient_id).await?;
            let item = patient.new_item(&column)?;
            let mut attrs = item.copy_for_edit();
            attrs.extend(parse_values(&values)?);
            client.save_item(&mut patient, item, attrs).await?;

            let count = patient.item_count(&column);
            match patient.item(&column, count.saturating_sub(1)) {
                Some(item) => println!("Created {} item {}", column, display_id(item)),
                None => println!("Created {} item", column),
            }
        }
        Some(Commands::Update {
            patient_id,
            column,
            item_id,
            values,
        }) => {
            let mut patient = client.load_patient(patient_id).await?;
            let item = find_item(&patient, &column, item_id)?.clone();
            let mut attrs = item.copy_for_edit();
            attrs.extend(parse_values(&values)?);
            client.save_item(&mut patient, item, attrs).await?;
            println!("Updated {} item {}", column, item_id);
        }
        Some(Commands::Delete {
            patient_id,
            column,
            item_id,
        }) => {
            let mut patient = client.load_patient(patient_id).await?;
            let item = find_item(&patient, &column, item_id)?.clone();
            client.destroy_item(&mut patient, &item).await?;
            println!("Deleted {} item {}", column, item_id);
        }
        None => {
            println!("Use 'opal --help' for commands");
        }
    }

    Ok(())
}

fn find_item<'a>(
    patient: &'a Patient,
    column: &str,
    item_id: RecordId,
) -> anyhow::Result<&'a Item> {
    patient.schema().column_by_name(column)?;
    patient
        .items(column)
        .iter()
        .find(|item| item.id() == Some(item_id))
        .with_context(|| format!("patient {} has no {} item {}", patient.id(), column, item_id))
}

/// Parses `key=value` arguments; values are JSON when they parse as JSON, strings otherwise.
fn parse_values(values: &[String]) -> anyhow::Result<Map<String, Value>> {
    values
        .iter()
        .map(|pair| {
            let (key, raw) = pair
                .split_once('=')
                .with_context(|| format!("expected key=value, got {pair:?}"))?;
            let value =
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}

fn print_patient_list(patients: &[Patient], ordering: &PatientOrdering) {
    if patients.is_empty() {
        println!("No patients found.");
        return;
    }

    for patient in patients {
        let location = patient.location();
        let text = |key: &str| location.and_then(|item| item.text(key)).unwrap_or("-");
        let bed = location
            .and_then(|item| item.get(opal_core::constants::BED_KEY))
            .map(display_value)
            .unwrap_or_else(|| "-".into());
        let category = text(opal_core::constants::CATEGORY_KEY);
        let known = ordering.category_rank(Some(category)).is_some();

        println!(
            "ID: {}, Name: {}, Category: {}{}, Hospital: {}, Ward: {}, Bed: {}",
            patient.id(),
            patient.name().unwrap_or("-"),
            category,
            if known { "" } else { " (unranked)" },
            text(opal_core::constants::HOSPITAL_KEY),
            text(opal_core::constants::WARD_KEY),
            bed
        );
    }
}

fn print_patient(patient: &Patient) {
    println!(
        "Patient {}: {}",
        patient.id(),
        patient.name().unwrap_or("(no name)")
    );
    for column in patient.schema().columns() {
        let items = patient.items(&column.name);
        println!("{} ({})", column.name, items.len());
        for item in items {
            println!("  item {}", display_id(item));
            for (name, value) in item.fields() {
                println!("    {}: {}", name, display_value(value));
            }
        }
    }
}

fn display_id(item: &Item) -> String {
    item.id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(unsaved)".into())
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Date(date) => opal_core::dates::format_date(*date),
        FieldValue::Value(Value::String(text)) => text.clone(),
        other => other.to_json().to_string(),
    }
}
