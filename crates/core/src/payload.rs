//! Identifier resolution for decoded QR payloads.
//!
//! The payload format is decided by whoever printed the code, so resolution tries, in order:
//!
//! 1. the fixed test token printed on the demo patient card,
//! 2. a JSON object carrying `patientId` or `id`,
//! 3. the digits left after stripping every non-digit character.
//!
//! Anything else is rejected with [`ScanError::PayloadInvalid`], carrying the raw text.

use crate::constants::{IDENTIFIER_FIELDS, SENTINEL_PATIENT_ID, SENTINEL_PAYLOAD};
use crate::ScanError;
use serde_json::{Map, Value};
use swastha_types::PatientIdentifier;

/// Resolve a raw decoded payload to the identifier of the patient to look up.
pub fn resolve_identifier(raw: &str) -> Result<PatientIdentifier, ScanError> {
    let invalid = || ScanError::PayloadInvalid {
        raw: raw.to_string(),
    };

    if raw == SENTINEL_PAYLOAD {
        return PatientIdentifier::new(SENTINEL_PATIENT_ID).map_err(|_| invalid());
    }

    let candidate = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => structured_identifier(&fields),
        _ => Some(raw.chars().filter(char::is_ascii_digit).collect::<String>()),
    };

    candidate
        .and_then(|c| PatientIdentifier::new(c).ok())
        .ok_or_else(invalid)
}

/// First usable identifier field of a structured payload.
fn structured_identifier(fields: &Map<String, Value>) -> Option<String> {
    IDENTIFIER_FIELDS.iter().find_map(|name| match fields.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(raw: &str) -> String {
        resolve_identifier(raw).unwrap().to_string()
    }

    #[test]
    fn sentinel_resolves_to_fixture_identifier() {
        assert_eq!(resolved(SENTINEL_PAYLOAD), SENTINEL_PATIENT_ID);
    }

    #[test]
    fn sentinel_wins_over_digit_extraction() {
        // The token contains the digits "30"; the fixture must still win.
        assert_ne!(resolved(SENTINEL_PAYLOAD), "30");
    }

    #[test]
    fn structured_patient_id_field() {
        assert_eq!(resolved(r#"{"patientId":"42"}"#), "42");
        assert_eq!(resolved(r#"{"patientId":42}"#), "42");
    }

    #[test]
    fn structured_id_field() {
        assert_eq!(resolved(r#"{"id":"42"}"#), "42");
    }

    #[test]
    fn patient_id_takes_priority_over_id() {
        assert_eq!(resolved(r#"{"id":"7","patientId":"42"}"#), "42");
    }

    #[test]
    fn empty_patient_id_falls_back_to_id() {
        assert_eq!(resolved(r#"{"patientId":"","id":"PAT003"}"#), "PAT003");
    }

    #[test]
    fn structured_payload_without_identifier_is_invalid() {
        let raw = r#"{"memberNumber":"XYZ123"}"#;
        assert_eq!(
            resolve_identifier(raw),
            Err(ScanError::PayloadInvalid { raw: raw.into() })
        );

        let raw = r#"{"patientId":null,"id":true}"#;
        assert!(resolve_identifier(raw).is_err());
    }

    #[test]
    fn numeric_extraction_from_unstructured_text() {
        assert_eq!(resolved("abc123xyz"), "123");
        assert_eq!(resolved("55"), "55");
        assert_eq!(resolved("PAT-0-0-4"), "004");
    }

    #[test]
    fn json_scalars_use_numeric_extraction() {
        assert_eq!(resolved("\"id-77\""), "77");
        assert_eq!(resolved("[1, 2]"), "12");
    }

    #[test]
    fn no_digits_is_invalid() {
        assert_eq!(
            resolve_identifier("no-digits-here"),
            Err(ScanError::PayloadInvalid {
                raw: "no-digits-here".into()
            })
        );
        assert!(resolve_identifier("").is_err());
    }

    #[test]
    fn unsafe_structured_identifier_is_invalid() {
        assert!(resolve_identifier(r#"{"patientId":"../admin"}"#).is_err());
    }

    #[test]
    fn dot_segment_identifier_is_invalid() {
        for raw in [r#"{"patientId":".."}"#, r#"{"id":"."}"#] {
            assert_eq!(
                resolve_identifier(raw),
                Err(ScanError::PayloadInvalid { raw: raw.into() })
            );
        }
    }
}
