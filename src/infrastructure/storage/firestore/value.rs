//! Conversion between plain JSON and Firestore typed values
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type, e.g. `{"stringValue": "Acme"}` or `{"integerValue": "42"}`.

use serde_json::{Map, Number, Value};

use crate::domain::DomainError;

/// Encodes a JSON value as a Firestore `Value`
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // int64 travels as a decimal string
                serde_json::json!({ "integerValue": i.to_string() })
            } else {
                serde_json::json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            serde_json::json!({ "arrayValue": { "values": values } })
        }
        Value::Object(object) => {
            serde_json::json!({ "mapValue": { "fields": encode_fields(object) } })
        }
    }
}

/// Encodes every entry of a JSON object into a Firestore `fields` map
pub fn encode_fields(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Decodes a Firestore `Value` into plain JSON
pub fn decode_value(value: &Value) -> Result<Value, DomainError> {
    let object = value
        .as_object()
        .ok_or_else(|| DomainError::storage(format!("Malformed Firestore value: {}", value)))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| DomainError::storage("Empty Firestore value"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or_default())),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(Value::String(inner.as_str().unwrap_or_default().to_string()))
        }
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, DomainError>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields").and_then(Value::as_object) {
                Some(fields) => decode_fields(fields)?,
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(DomainError::storage(format!(
            "Unsupported Firestore value type: {}",
            other
        ))),
    }
}

/// Decodes a Firestore `fields` map into a plain JSON object
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, DomainError> {
    fields
        .iter()
        .map(|(name, value)| decode_value(value).map(|decoded| (name.clone(), decoded)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value, DomainError> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };

    parsed
        .map(|i| Value::Number(i.into()))
        .ok_or_else(|| DomainError::storage(format!("Invalid Firestore integer: {}", inner)))
}
