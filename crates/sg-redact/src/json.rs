//! Conversion between [`Record`] and JSON.
//!
//! Field names come from the schema. Bytes are standard base64, 64-bit
//! integers are read from either JSON numbers or strings, and maps with
//! scalar keys are JSON objects.

use crate::error::RecordError;
use crate::record::{MapEntry, Record, RecordView, Value};
use crate::schema::{Cardinality, FieldPolicyLookup, FieldType, SchemaRegistry};
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

/// Build a record of type `type_name` from a JSON object.
///
/// `null` members are treated as absent.
pub fn record_from_json(
    type_name: &str,
    json: &JsonValue,
    schemas: &SchemaRegistry,
) -> Result<Record, RecordError> {
    parse_record(type_name, json, schemas, "")
}

/// Render a record as a JSON object.
///
/// Fields without a known name are keyed `#<number>`.
pub fn record_to_json<L>(record: &Record, lookup: &L) -> JsonValue
where
    L: FieldPolicyLookup + ?Sized,
{
    let mut object = Map::with_capacity(record.len());
    for (id, value) in record.iter() {
        let name = lookup
            .field_name(record.type_name(), id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());
        object.insert(name, value_to_json(value, lookup));
    }
    JsonValue::Object(object)
}

fn parse_record(
    type_name: &str,
    json: &JsonValue,
    schemas: &SchemaRegistry,
    path: &str,
) -> Result<Record, RecordError> {
    if schemas.message(type_name).is_none() {
        return Err(RecordError::UnknownMessage(type_name.to_string()));
    }
    let object = json.as_object().ok_or_else(|| mismatch(path, type_name))?;

    let mut record = Record::new(type_name);
    for (name, member) in object {
        let field = schemas
            .field_by_name(type_name, name)
            .ok_or_else(|| RecordError::UnknownField {
                message: type_name.to_string(),
                field: name.clone(),
            })?;
        if member.is_null() {
            continue;
        }

        let field_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", path, name)
        };

        let value = match &field.cardinality {
            Cardinality::Singular => parse_single(&field.field_type, member, schemas, &field_path)?,
            Cardinality::Repeated => {
                let items = member
                    .as_array()
                    .ok_or_else(|| mismatch(&field_path, "array"))?;
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        parse_single(
                            &field.field_type,
                            item,
                            schemas,
                            &format!("{}[{}]", field_path, idx),
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(values)
            }
            Cardinality::Map { key } => {
                let members = member
                    .as_object()
                    .ok_or_else(|| mismatch(&field_path, "object"))?;
                let mut entries = Vec::with_capacity(members.len());
                for (raw_key, item) in members {
                    let entry_path = format!("{}{{{}}}", field_path, raw_key);
                    entries.push(MapEntry {
                        key: parse_key(key, raw_key, &entry_path)?,
                        value: parse_single(&field.field_type, item, schemas, &entry_path)?,
                    });
                }
                Value::Map(entries)
            }
        };
        record.set(field.id(), value);
    }
    Ok(record)
}

fn parse_single(
    field_type: &FieldType,
    json: &JsonValue,
    schemas: &SchemaRegistry,
    path: &str,
) -> Result<Value, RecordError> {
    let value = match field_type {
        FieldType::Bool => Value::Bool(json.as_bool().ok_or_else(|| mismatch(path, "bool"))?),
        FieldType::Int => Value::Int(
            json.as_i64()
                .or_else(|| json.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| mismatch(path, "int"))?,
        ),
        FieldType::Uint => Value::Uint(
            json.as_u64()
                .or_else(|| json.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| mismatch(path, "uint"))?,
        ),
        FieldType::Float => Value::Float(json.as_f64().ok_or_else(|| mismatch(path, "float"))?),
        FieldType::String => Value::String(
            json.as_str()
                .ok_or_else(|| mismatch(path, "string"))?
                .to_string(),
        ),
        FieldType::Bytes => {
            let encoded = json.as_str().ok_or_else(|| mismatch(path, "bytes"))?;
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|_| RecordError::InvalidBase64 {
                    path: path.to_string(),
                })?;
            Value::Bytes(decoded)
        }
        FieldType::Enum => Value::Enum(
            json.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| mismatch(path, "enum"))?,
        ),
        FieldType::Message(name) => Value::Record(parse_record(name, json, schemas, path)?),
    };
    Ok(value)
}

fn parse_key(key_type: &FieldType, raw: &str, path: &str) -> Result<Value, RecordError> {
    let key = match key_type {
        FieldType::String => Some(Value::String(raw.to_string())),
        FieldType::Int => raw.parse().ok().map(Value::Int),
        FieldType::Uint => raw.parse().ok().map(Value::Uint),
        FieldType::Bool => raw.parse().ok().map(Value::Bool),
        _ => {
            return Err(RecordError::UnsupportedMapKey {
                path: path.to_string(),
            })
        }
    };
    key.ok_or_else(|| mismatch(path, key_type.describe()))
}

fn mismatch(path: &str, expected: &str) -> RecordError {
    RecordError::TypeMismatch {
        path: if path.is_empty() {
            "<root>".to_string()
        } else {
            path.to_string()
        },
        expected: expected.to_string(),
    }
}

fn value_to_json<L>(value: &Value, lookup: &L) -> JsonValue
where
    L: FieldPolicyLookup + ?Sized,
{
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(n) => JsonValue::from(*n),
        Value::Uint(n) => JsonValue::from(*n),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(bytes) | Value::Unknown(bytes) => {
            JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        Value::Enum(n) => JsonValue::from(*n),
        Value::Record(record) => record_to_json(record, lookup),
        Value::List(items) => {
            JsonValue::Array(items.iter().map(|v| value_to_json(v, lookup)).collect())
        }
        Value::Map(entries) => map_to_json(entries, lookup),
    }
}

fn map_to_json<L>(entries: &[MapEntry], lookup: &L) -> JsonValue
where
    L: FieldPolicyLookup + ?Sized,
{
    let keys: Option<Vec<String>> = entries.iter().map(|e| scalar_key(&e.key)).collect();

    match keys {
        Some(keys) => JsonValue::Object(
            keys.into_iter()
                .zip(entries)
                .map(|(k, e)| (k, value_to_json(&e.value, lookup)))
                .collect(),
        ),
        None => JsonValue::Array(
            entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "key": value_to_json(&e.key, lookup),
                        "value": value_to_json(&e.value, lookup),
                    })
                })
                .collect(),
        ),
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Uint(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
