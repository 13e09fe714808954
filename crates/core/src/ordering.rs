//! Patient list ordering.
//!
//! Patients are listed by the category of their current location, then hospital, ward and bed.
//! The category order and the hospitals whose wards are numbered `T1`, `T2`, ... are injected
//! through [`PatientOrdering`] rather than fixed at compile time.

use crate::constants::{
    BED_KEY, CATEGORY_KEY, DEFAULT_CATEGORIES, DEFAULT_NUMERIC_WARD_HOSPITALS, HOSPITAL_KEY,
    WARD_KEY,
};
use crate::patient::Patient;
use serde_json::Value;
use std::cmp::Ordering;

/// Ordering configuration for patient lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientOrdering {
    categories: Vec<String>,
    numeric_ward_hospitals: Vec<String>,
}

impl Default for PatientOrdering {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            DEFAULT_NUMERIC_WARD_HOSPITALS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
    }
}

impl PatientOrdering {
    pub fn new(categories: Vec<String>, numeric_ward_hospitals: Vec<String>) -> Self {
        Self {
            categories,
            numeric_ward_hospitals,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn numeric_ward_hospitals(&self) -> &[String] {
        &self.numeric_ward_hospitals
    }

    /// Position of `category` in the configured order; `None` sorts before every known category.
    pub fn category_rank(&self, category: Option<&str>) -> Option<usize> {
        let category = category?;
        self.categories.iter().position(|c| c == category)
    }

    /// Compares two patients for display.
    ///
    /// Keys are compared in turn and the first difference decides: category rank, hospital,
    /// ward, bed. A patient without a location item has no category, an empty hospital and
    /// ward, and no bed number.
    pub fn compare(&self, a: &Patient, b: &Patient) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    /// Stable in-place sort of a patient list.
    pub fn sort(&self, patients: &mut [Patient]) {
        patients.sort_by(|a, b| self.compare(a, b));
    }

    fn sort_key<'a>(&self, patient: &'a Patient) -> SortKey<'a> {
        let location = patient.location();
        let text = |key: &str| location.and_then(|item| item.text(key)).unwrap_or("");

        let hospital = text(HOSPITAL_KEY);
        let ward = text(WARD_KEY);
        let ward = match numbered_ward(ward) {
            Some(number) if self.numeric_ward_hospitals.iter().any(|h| h == hospital) => {
                WardKey::Number(number)
            }
            _ => WardKey::Text(ward),
        };
        let bed = location
            .and_then(|item| item.value(BED_KEY))
            .and_then(bed_number)
            .map_or(BedKey::Unnumbered, BedKey::Number);

        SortKey {
            category: self.category_rank(location.and_then(|item| item.text(CATEGORY_KEY))),
            hospital,
            ward,
            bed,
        }
    }
}

/// Sorts patients in place for display.
pub fn sort_patients(patients: &mut [Patient], ordering: &PatientOrdering) {
    ordering.sort(patients);
}

// Field order is comparison order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    category: Option<usize>,
    hospital: &'a str,
    ward: WardKey<'a>,
    bed: BedKey,
}

// Numbered wards sort before named ones.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum WardKey<'a> {
    Number(i64),
    Text(&'a str),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum BedKey {
    Number(i64),
    Unnumbered,
}

/// Number of a ward named `T<digits>...`.
fn numbered_ward(ward: &str) -> Option<i64> {
    let rest = ward.strip_prefix('T')?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..digits_end].parse().ok()
}

fn bed_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64)),
        Value::String(text) => leading_integer(text),
        _ => None,
    }
}

/// Parses the integer at the start of `text`, ignoring leading whitespace and anything after
/// the digits.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let magnitude: i64 = unsigned[..digits_end].parse().ok()?;
    Some(sign * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::from_json(json!([
                {"name": "demographics", "single": true, "fields": [{"name": "name", "type": "string"}]},
                {"name": "location", "single": true, "fields": [
                    {"name": "category", "type": "string"},
                    {"name": "hospital", "type": "string"},
                    {"name": "ward", "type": "string"},
                    {"name": "bed", "type": "string"}
                ]}
            ]))
            .unwrap(),
        )
    }

    fn patient(id: i64, category: &str, hospital: &str, ward: &str, bed: Value) -> Patient {
        Patient::from_resource(
            json!({
                "id": id,
                "demographics": [{"name": format!("Patient {id}")}],
                "location": [{
                    "category": category,
                    "hospital": hospital,
                    "ward": ward,
                    "bed": bed
                }]
            }),
            schema(),
        )
        .unwrap()
    }

    #[test]
    fn test_category_decides_first() {
        let ordering = PatientOrdering::default();
        let review = patient(1, "Review", "UCH", "T1", json!("1"));
        let inpatient = patient(2, "Inpatient", "UCH", "T9", json!("9"));

        assert_eq!(ordering.compare(&inpatient, &review), Ordering::Less);
        assert_eq!(review.compare(&inpatient, &ordering), Ordering::Greater);
    }

    #[test]
    fn test_unknown_category_sorts_before_known() {
        let ordering = PatientOrdering::default();
        let unknown = patient(1, "Outpatient", "UCH", "T1", json!("1"));
        let inpatient = patient(2, "Inpatient", "UCH", "T1", json!("1"));

        assert_eq!(ordering.compare(&unknown, &inpatient), Ordering::Less);
    }

    #[test]
    fn test_hospital_compared_as_string() {
        let ordering = PatientOrdering::default();
        let uch = patient(1, "Inpatient", "UCH", "T1", json!("1"));
        let gen = patient(2, "Inpatient", "GEN", "T1", json!("1"));

        assert_eq!(ordering.compare(&gen, &uch), Ordering::Less);
    }

    #[test]
    fn test_uch_wards_compared_numerically() {
        let ordering = PatientOrdering::default();
        let t2 = patient(1, "Inpatient", "UCH", "T2", json!("5"));
        let t10 = patient(2, "Inpatient", "UCH", "T10", json!("1"));

        assert_eq!(ordering.compare(&t2, &t10), Ordering::Less);
    }

    #[test]
    fn test_other_hospital_wards_compared_as_strings() {
        let ordering = PatientOrdering::default();
        let t2 = patient(1, "Inpatient", "GEN", "T2", json!("1"));
        let t10 = patient(2, "Inpatient", "GEN", "T10", json!("1"));

        assert_eq!(ordering.compare(&t10, &t2), Ordering::Less);
    }

    #[test]
    fn test_numbered_ward_sorts_before_named_ward() {
        let ordering = PatientOrdering::default();
        let numbered = patient(1, "Inpatient", "UCH", "T16", json!("1"));
        let named = patient(2, "Inpatient", "UCH", "ACU", json!("1"));

        assert_eq!(ordering.compare(&numbered, &named), Ordering::Less);
        assert_eq!(ordering.compare(&named, &numbered), Ordering::Greater);
    }

    #[test]
    fn test_bed_compared_as_integer() {
        let ordering = PatientOrdering::default();
        let bed_9 = patient(1, "Inpatient", "UCH", "T3", json!("9"));
        let bed_12 = patient(2, "Inpatient", "UCH", "T3", json!("12a"));
        let bed_num = patient(3, "Inpatient", "UCH", "T3", json!(10));
        let no_bed = patient(4, "Inpatient", "UCH", "T3", json!("side room"));

        assert_eq!(ordering.compare(&bed_9, &bed_12), Ordering::Less);
        assert_eq!(ordering.compare(&bed_num, &bed_12), Ordering::Less);
        assert_eq!(ordering.compare(&bed_12, &no_bed), Ordering::Less);
    }

    #[test]
    fn test_equal_keys_compare_equal() {
        let ordering = PatientOrdering::default();
        let a = patient(1, "Followup", "UCH", "T4", json!("2"));
        let b = patient(2, "Followup", "UCH", "T4", json!(" 2"));

        assert_eq!(ordering.compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_injected_categories_change_order() {
        let ordering = PatientOrdering::new(
            vec!["Review".into(), "Inpatient".into()],
            vec!["GEN".into()],
        );
        let review = patient(1, "Review", "GEN", "T10", json!("1"));
        let inpatient = patient(2, "Inpatient", "GEN", "T2", json!("1"));
        assert_eq!(ordering.compare(&review, &inpatient), Ordering::Less);

        let t10 = patient(3, "Review", "GEN", "T10", json!("1"));
        let t2 = patient(4, "Review", "GEN", "T2", json!("1"));
        assert_eq!(ordering.compare(&t2, &t10), Ordering::Less);
    }

    #[test]
    fn test_sort_patients_orders_list() {
        let mut patients = vec![
            patient(1, "Discharged", "UCH", "T1", json!("1")),
            patient(2, "Inpatient", "UCH", "T10", json!("1")),
            patient(3, "Inpatient", "UCH", "T2", json!("3")),
            patient(4, "Inpatient", "GEN", "B", json!("1")),
        ];
        sort_patients(&mut patients, &PatientOrdering::default());

        let ids: Vec<i64> = patients.iter().map(Patient::id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_leading_integer_semantics() {
        assert_eq!(leading_integer("12"), Some(12));
        assert_eq!(leading_integer("  7b"), Some(7));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer("b7"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn test_numbered_ward_requires_t_prefix() {
        assert_eq!(numbered_ward("T13"), Some(13));
        assert_eq!(numbered_ward("T7 North"), Some(7));
        assert_eq!(numbered_ward("t7"), None);
        assert_eq!(numbered_ward("T"), None);
        assert_eq!(numbered_ward("AMU"), None);
    }
}
