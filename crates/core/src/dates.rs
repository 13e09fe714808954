//! Wire date handling.
//!
//! Date fields travel as `YYYY-MM-DD` strings and are held in memory as [`NaiveDate`] values with
//! day precision in the local calendar. No time zone is attached: `"2020-03-05"` is always the
//! 5th of March 2020, whatever zone the process runs in.

use crate::item::FieldValue;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Converts a raw attribute value into a [`FieldValue`] for a date-typed field.
///
/// Strings are split on `-` into year, month and day tokens. Anything that is not a string is
/// treated as already parsed and passed through unchanged, as is a string that does not name a
/// real calendar day (the latter is logged).
pub fn parse_date(value: Value) -> FieldValue {
    match value {
        Value::String(text) => match parse_date_str(&text) {
            Some(date) => FieldValue::Date(date),
            None => {
                tracing::warn!("unparseable date value: {:?}", text);
                FieldValue::Value(Value::String(text))
            }
        },
        other => FieldValue::Value(other),
    }
}

/// Parses a `YYYY-MM-DD` string.
///
/// The month token is one-based on the wire; it is shifted to a zero-based month index and back
/// onto chrono's one-based calendar, so the returned date is the day written in the string.
pub fn parse_date_str(text: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = text.split('-').collect();
    let [year, month, day] = tokens.as_slice() else {
        return None;
    };

    let year: i32 = year.trim().parse().ok()?;
    let month_index = month.trim().parse::<u32>().ok()?.checked_sub(1)?;
    let day: u32 = day.trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month_index + 1, day)
}

/// Formats a date the way the backend expects it.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date_adjusts_month_index() {
        let parsed = parse_date(json!("2020-03-05"));
        assert_eq!(
            parsed,
            FieldValue::Date(NaiveDate::from_ymd_opt(2020, 3, 5).unwrap())
        );
    }

    #[test]
    fn test_parse_date_accepts_unpadded_tokens() {
        assert_eq!(
            parse_date_str("1999-1-9"),
            NaiveDate::from_ymd_opt(1999, 1, 9)
        );
    }

    #[test]
    fn test_parse_date_passes_non_strings_through() {
        assert_eq!(parse_date(json!(null)), FieldValue::Value(json!(null)));
        assert_eq!(parse_date(json!(17)), FieldValue::Value(json!(17)));
        assert_eq!(
            parse_date(json!({"already": "parsed"})),
            FieldValue::Value(json!({"already": "parsed"}))
        );
    }

    #[test]
    fn test_parse_date_keeps_invalid_strings() {
        assert_eq!(parse_date(json!("")), FieldValue::Value(json!("")));
        assert_eq!(
            parse_date(json!("2020-13-01")),
            FieldValue::Value(json!("2020-13-01"))
        );
        assert_eq!(
            parse_date(json!("2020-00-01")),
            FieldValue::Value(json!("2020-00-01"))
        );
        assert_eq!(
            parse_date(json!("2020-03-05T10:00")),
            FieldValue::Value(json!("2020-03-05T10:00"))
        );
    }

    #[test]
    fn test_format_date_pads_components() {
        let date = NaiveDate::from_ymd_opt(2021, 7, 4).unwrap();
        assert_eq!(format_date(date), "2021-07-04");
        assert_eq!(parse_date_str(&format_date(date)), Some(date));
    }
}
