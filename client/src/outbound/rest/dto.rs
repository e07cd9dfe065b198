//! Wire DTOs for the identity toolkit and the typed document format.
//!
//! Documents travel as `{"fields": {name: {<type>Value: ...}}}`. Encoding maps
//! plain JSON onto those typed values; decoding reverses it and rejects value
//! kinds the client has no representation for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};

use crate::domain::ports::DocumentFields;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OobCodeRequestDto<'a> {
    pub(super) request_type: &'a str,
    pub(super) email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthResponseDto {
    pub(super) local_id: String,
    pub(super) id_token: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DocumentDto {
    #[serde(default)]
    pub(super) fields: Map<String, Value>,
}

/// Read `message` from an `{error: {message}}` body, if present.
pub(super) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
}

/// Wrap `fields` in the typed document body.
pub(super) fn encode_document(fields: &DocumentFields) -> Value {
    json!({ "fields": encode_fields(fields) })
}

fn encode_fields(fields: &DocumentFields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            json!({ "integerValue": number.to_string() })
        }
        Value::Number(number) => json!({ "doubleValue": number }),
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a typed document body into plain fields.
pub(super) fn decode_document(body: &[u8]) -> Result<DocumentFields, String> {
    let document: DocumentDto =
        serde_json::from_slice(body).map_err(|error| format!("invalid document JSON: {error}"))?;
    decode_fields(&document.fields)
}

fn decode_fields(fields: &Map<String, Value>) -> Result<DocumentFields, String> {
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|error| format!("field `{key}`: {error}"))
        })
        .collect()
}

fn decode_value(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|typed| typed.iter().next()) else {
        return Err("expected a typed value object".to_owned());
    };
    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(flag)) => Ok(Value::Bool(*flag)),
        ("stringValue" | "timestampValue" | "referenceValue", Value::String(text)) => {
            Ok(Value::String(text.clone()))
        }
        ("integerValue", Value::String(text)) => text
            .parse::<i64>()
            .map(|parsed| Value::Number(parsed.into()))
            .map_err(|error| format!("bad integer {text:?}: {error}")),
        ("integerValue" | "doubleValue", Value::Number(number)) => {
            Ok(Value::Number(number.clone()))
        }
        ("doubleValue", Value::String(text)) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("bad double {text:?}")),
        ("arrayValue", Value::Object(array)) => match array.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(items)) => items
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(_) => Err("arrayValue.values must be a list".to_owned()),
        },
        ("mapValue", Value::Object(map)) => match map.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(_) => Err("mapValue.fields must be an object".to_owned()),
        },
        (other, _) => Err(format!("unsupported value kind `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn object(value: Value) -> DocumentFields {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn profile_fields_encode_as_string_values() {
        let fields = object(json!({ "name": "Ada", "email": "ada@example.com", "username": "ada" }));

        assert_eq!(
            encode_document(&fields),
            json!({
                "fields": {
                    "email": { "stringValue": "ada@example.com" },
                    "name": { "stringValue": "Ada" },
                    "username": { "stringValue": "ada" },
                }
            })
        );
    }

    #[test]
    fn nested_values_decode_to_plain_json() {
        let body = json!({
            "name": "projects/p/databases/(default)/documents/users/uid-a",
            "fields": {
                "name": { "stringValue": "Ada" },
                "recipes": { "integerValue": "12" },
                "rating": { "doubleValue": 4.5 },
                "tags": { "arrayValue": { "values": [{ "stringValue": "vegan" }] } },
                "prefs": { "mapValue": { "fields": { "spicy": { "booleanValue": true } } } },
                "deleted": { "nullValue": null },
            },
            "createTime": "2024-01-01T00:00:00Z"
        });

        let decoded = decode_document(body.to_string().as_bytes()).expect("document decodes");

        assert_eq!(
            Value::Object(decoded),
            json!({
                "name": "Ada",
                "recipes": 12,
                "rating": 4.5,
                "tags": ["vegan"],
                "prefs": { "spicy": true },
                "deleted": null,
            })
        );
    }

    #[test]
    fn documents_without_fields_decode_empty() {
        let decoded = decode_document(br#"{"name":"projects/p/x"}"#).expect("document decodes");
        assert!(decoded.is_empty());
    }

    #[rstest]
    #[case(json!({ "fields": { "pos": { "geoPointValue": { "latitude": 1.0 } } } }), "geoPointValue")]
    #[case(json!({ "fields": { "n": { "integerValue": "twelve" } } }), "bad integer")]
    #[case(json!({ "fields": { "n": "bare" } }), "typed value")]
    fn unreadable_values_name_the_problem(#[case] body: Value, #[case] mentions: &str) {
        let error = decode_document(body.to_string().as_bytes()).expect_err("decode should fail");
        assert!(error.contains(mentions), "{error} should mention {mentions}");
    }

    #[rstest]
    #[case(br#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#.as_slice(), Some("EMAIL_EXISTS"))]
    #[case(b"<html>bad gateway</html>".as_slice(), None)]
    fn error_messages_are_extracted_when_present(
        #[case] body: &[u8],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(error_message(body).as_deref(), expected);
    }
}
