//! Payload decoding
//!
//! Accepted shapes, tried in order:
//! 1. a JSON object
//! 2. a JSON-like object written with single quotes (`{'distance': 12}`)
//! 3. a bare numeric literal (`17.5`)
//!
//! From a decoded object the value comes from the first present field among
//! `distance`, `msg`, `value`. A present field that is not numeric is an error,
//! later fields are not consulted.

use contracts::{RawReading, SourceField};
use serde_json::{Map, Value};

use crate::error::ParseError;

type Object = Map<String, Value>;

/// Decode one broker payload into a raw reading
pub fn decode(payload: &[u8]) -> Result<RawReading, ParseError> {
    if let Some(object) = decode_object(payload) {
        return extract(&object);
    }
    if let Some(object) = decode_single_quoted(payload) {
        return extract(&object);
    }
    match decode_bare_number(payload) {
        Some(raw_value) => Ok(RawReading {
            raw_value,
            source_field: SourceField::Distance,
        }),
        None => Err(ParseError::InvalidPayload),
    }
}

fn decode_object(payload: &[u8]) -> Option<Object> {
    match serde_json::from_slice(payload).ok()? {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

fn decode_single_quoted(payload: &[u8]) -> Option<Object> {
    let text = std::str::from_utf8(payload).ok()?;
    if !text.contains('\'') {
        return None;
    }
    decode_object(text.replace('\'', "\"").as_bytes())
}

fn decode_bare_number(payload: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    let text = strip_quotes(text);
    parse_number(text)
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}

/// Finite decimal literals only; `NaN` and `inf` spellings are text
fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn extract(object: &Object) -> Result<RawReading, ParseError> {
    let Some((source_field, value)) = SourceField::PRECEDENCE
        .iter()
        .find_map(|field| object.get(field.as_str()).map(|value| (*field, value)))
    else {
        return Err(ParseError::InvalidDistance { field: None });
    };

    numeric_value(value)
        .map(|raw_value| RawReading {
            raw_value,
            source_field,
        })
        .ok_or(ParseError::InvalidDistance {
            field: Some(source_field),
        })
}

/// Numbers, and strings whose trimmed content is a number
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number(text.trim()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(payload: &str) -> Result<RawReading, ParseError> {
        decode(payload.as_bytes())
    }

    #[test]
    fn json_object_distance() {
        let reading = raw(r#"{"distance": 12.5}"#).unwrap();
        assert_eq!(reading.raw_value, 12.5);
        assert_eq!(reading.source_field, SourceField::Distance);
    }

    #[test]
    fn field_precedence() {
        let reading = raw(r#"{"value": 1, "msg": 2, "distance": 3}"#).unwrap();
        assert_eq!(reading.raw_value, 3.0);
        assert_eq!(reading.source_field, SourceField::Distance);

        let reading = raw(r#"{"value": 1, "msg": 2}"#).unwrap();
        assert_eq!(reading.raw_value, 2.0);
        assert_eq!(reading.source_field, SourceField::Msg);

        let reading = raw(r#"{"value": 40}"#).unwrap();
        assert_eq!(reading.source_field, SourceField::Value);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let reading = raw(r#"{"msg": " 42 "}"#).unwrap();
        assert_eq!(reading.raw_value, 42.0);
        assert_eq!(reading.source_field, SourceField::Msg);
    }

    #[test]
    fn single_quoted_object() {
        let reading = raw("{'distance': 8}").unwrap();
        assert_eq!(reading.raw_value, 8.0);
    }

    #[test]
    fn bare_number() {
        let reading = raw("17.5").unwrap();
        assert_eq!(reading.raw_value, 17.5);
        assert_eq!(reading.source_field, SourceField::Distance);

        assert_eq!(raw(" 3 \n").unwrap().raw_value, 3.0);
        assert_eq!(raw("\"9\"").unwrap().raw_value, 9.0);
    }

    #[test]
    fn negative_values_pass_decoding() {
        assert_eq!(raw(r#"{"distance": -4}"#).unwrap().raw_value, -4.0);
    }

    #[test]
    fn present_non_numeric_field_is_invalid() {
        assert_eq!(
            raw(r#"{"distance": "abc", "value": 5}"#),
            Err(ParseError::InvalidDistance {
                field: Some(SourceField::Distance)
            })
        );
        assert_eq!(
            raw(r#"{"distance": null}"#),
            Err(ParseError::InvalidDistance {
                field: Some(SourceField::Distance)
            })
        );
        assert_eq!(
            raw(r#"{"msg": ""}"#),
            Err(ParseError::InvalidDistance {
                field: Some(SourceField::Msg)
            })
        );
        assert_eq!(
            raw(r#"{"distance": "NaN"}"#),
            Err(ParseError::InvalidDistance {
                field: Some(SourceField::Distance)
            })
        );
        assert_eq!(
            raw(r#"{"value": "-infinity"}"#),
            Err(ParseError::InvalidDistance {
                field: Some(SourceField::Value)
            })
        );
    }

    #[test]
    fn missing_fields_are_invalid() {
        assert_eq!(
            raw(r#"{"temperature": 21}"#),
            Err(ParseError::InvalidDistance { field: None })
        );
        assert_eq!(raw("{}"), Err(ParseError::InvalidDistance { field: None }));
    }

    #[test]
    fn garbage_is_invalid_payload() {
        assert_eq!(raw("hello"), Err(ParseError::InvalidPayload));
        assert_eq!(raw(""), Err(ParseError::InvalidPayload));
        assert_eq!(raw("[1, 2]"), Err(ParseError::InvalidPayload));
        assert_eq!(raw("{'distance': }"), Err(ParseError::InvalidPayload));
        assert_eq!(decode(&[0xff, 0xfe]), Err(ParseError::InvalidPayload));
    }

    #[test]
    fn non_finite_literals_are_invalid_payload() {
        for payload in ["nan", "NaN", "inf", "-infinity", "\"inf\"", "1e400"] {
            assert_eq!(raw(payload), Err(ParseError::InvalidPayload), "{payload}");
        }
    }
}
