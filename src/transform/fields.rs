//! Typed access to record fields.

use crate::records::Record;
use serde_json::Value;
use thiserror::Error;

/// Why a single record could not be turned into rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' should be {expected}, found {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
}

fn invalid(field: &'static str, expected: &'static str, value: &Value) -> ExtractError {
    ExtractError::InvalidField {
        field,
        expected,
        found: value.to_string(),
    }
}

/// Absent keys and JSON nulls are both treated as "no value".
fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

pub fn optional_string(record: &Record, field: &'static str) -> Result<Option<String>, ExtractError> {
    match present(record, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(field, "a string", other)),
    }
}

pub fn required_string(record: &Record, field: &'static str) -> Result<String, ExtractError> {
    optional_string(record, field)?.ok_or(ExtractError::MissingField(field))
}

/// Identifiers show up both as JSON strings and as JSON numbers; both are kept
/// in their textual form.
pub fn optional_id(record: &Record, field: &'static str) -> Result<Option<String>, ExtractError> {
    match present(record, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(invalid(field, "a string or a number", other)),
    }
}

pub fn optional_f64(record: &Record, field: &'static str) -> Result<Option<f64>, ExtractError> {
    match present(record, field) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(field, "a number", value)),
    }
}

/// Integers, and floats without a fractional part.
pub fn optional_i64(record: &Record, field: &'static str) -> Result<Option<i64>, ExtractError> {
    match present(record, field) {
        None => Ok(None),
        Some(value) => {
            if let Some(i) = value.as_i64() {
                return Ok(Some(i));
            }
            match value.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(invalid(field, "an integer", value)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_null_and_absent_are_none() {
        let r = record(json!({"location": null}));
        assert_eq!(optional_string(&r, "location").unwrap(), None);
        assert_eq!(optional_string(&r, "title").unwrap(), None);
        assert_eq!(optional_f64(&r, "location").unwrap(), None);
    }

    #[test]
    fn test_empty_string_passes_through() {
        let r = record(json!({"artist_location": ""}));
        assert_eq!(
            optional_string(&r, "artist_location").unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_ids_accept_numbers() {
        let r = record(json!({"userId": 39, "sessionId": "583"}));
        assert_eq!(optional_id(&r, "userId").unwrap().as_deref(), Some("39"));
        assert_eq!(optional_id(&r, "sessionId").unwrap().as_deref(), Some("583"));
    }

    #[test]
    fn test_integers_accept_integral_floats() {
        let r = record(json!({"a": 1541990258000i64, "b": 2004.0, "c": 1.5, "d": "7"}));
        assert_eq!(optional_i64(&r, "a").unwrap(), Some(1541990258000));
        assert_eq!(optional_i64(&r, "b").unwrap(), Some(2004));
        assert!(matches!(
            optional_i64(&r, "c"),
            Err(ExtractError::InvalidField { field: "c", .. })
        ));
        assert!(optional_i64(&r, "d").is_err());
    }

    #[test]
    fn test_required_string_reports_missing_field() {
        let r = record(json!({}));
        assert_eq!(
            required_string(&r, "song_id"),
            Err(ExtractError::MissingField("song_id"))
        );
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let r = record(json!({"title": 12}));
        let err = optional_string(&r, "title").unwrap_err();
        assert_eq!(err.to_string(), "field 'title' should be a string, found 12");
    }
}
