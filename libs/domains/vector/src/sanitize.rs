//! Null stripping for metadata and filter payloads.
//!
//! The service rejects `null` inside metadata, but callers find it convenient to
//! express "no value" that way (and `Option` fields serialize to `null`). Null-valued
//! keys are removed recursively through nested objects. Arrays are left as they are.

use serde_json::{Map, Value};

/// Request fields whose contents are stripped of nulls before sending.
pub const SANITIZED_FIELDS: [&str; 3] = ["metadata", "filter", "setMetadata"];

/// Remove every key whose value is `null`, descending into nested objects.
///
/// An object whose fields are all null becomes an empty object rather than disappearing.
pub fn remove_null_values(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key, strip_nested(value)))
        .collect()
}

/// [`remove_null_values`] for an arbitrary value. Absent input stays absent.
pub fn remove_null_values_opt(value: Option<Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        other => Some(strip_nested(other)),
    }
}

fn strip_nested(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(remove_null_values(map)),
        other => other,
    }
}

/// Strip nulls inside [`SANITIZED_FIELDS`] of a request object, leaving other fields alone.
///
/// A sanitized field that is itself `null` is dropped from the payload.
pub fn sanitize_fields(payload: &mut Map<String, Value>) {
    for field in SANITIZED_FIELDS {
        match payload.get_mut(field) {
            Some(Value::Null) => {
                payload.remove(field);
            }
            Some(Value::Object(map)) => {
                let taken = std::mem::take(map);
                *map = remove_null_values(taken);
            }
            _ => {}
        }
    }
}
