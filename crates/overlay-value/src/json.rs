//! JSON interchange for values.
//!
//! [`from_json`] turns a JSON document into the dynamic shape a JSON decoder
//! would produce (`map[string]any`, `[]any`, numbers, strings, booleans,
//! nil). [`Value`] implements [`Serialize`], so any value can be written back
//! out with `serde_json`.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{ValueError, ValueResult};
use crate::key::Key;
use crate::ty::Type;
use crate::value::{Data, Value};

/// Convert a parsed JSON document into a value.
///
/// Integers become `i64` (or `u64` above `i64::MAX`), other numbers `f64`.
/// Object and array members are stored in dynamic slots.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::nil(),
        serde_json::Value::Bool(b) => Value::bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::i64(i)
            } else if let Some(u) = n.as_u64() {
                Value::u64(u)
            } else {
                Value::f64(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => {
            let items = items
                .into_iter()
                .map(|item| Value::dynamic(from_json(item)))
                .collect();
            Value::from_parts(Type::slice(Type::any()), Data::Slice(Some(items)))
        }
        serde_json::Value::Object(members) => {
            let entries = members
                .into_iter()
                .map(|(k, v)| (Key::Str(k), Value::dynamic(from_json(v))))
                .collect();
            Value::from_parts(
                Type::map(Type::string(), Type::any()),
                Data::Map(Some(entries)),
            )
        }
    }
}

/// Parse a JSON string into a value.
pub fn from_json_str(text: &str) -> ValueResult<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ValueError::Json(e.to_string()))?;
    Ok(from_json(json))
}

/// Render a value as a JSON document.
pub fn to_json(value: &Value) -> ValueResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ValueError::Json(e.to_string()))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.data() {
            Data::Bool(b) => serializer.serialize_bool(*b),
            Data::Int(v) => serializer.serialize_i64(*v),
            Data::Uint(v) => serializer.serialize_u64(*v),
            Data::Float(v) => serializer.serialize_f64(*v),
            Data::Complex(re, im) => [re, im].serialize(serializer),
            Data::Str(s) => serializer.serialize_str(s),
            Data::Handle(h) => serializer.serialize_u64(*h),
            Data::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (field, value) in self.ty().fields().iter().zip(fields) {
                    map.serialize_entry(&field.name, value)?;
                }
                map.end()
            }
            Data::Map(Some(entries)) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key.to_string(), value)?;
                }
                map.end()
            }
            Data::Slice(Some(items)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Data::Pointer(Some(ptr)) => ptr.get().serialize(serializer),
            Data::Dynamic(Some(inner)) => inner.serialize(serializer),
            Data::Map(None) | Data::Slice(None) | Data::Pointer(None) | Data::Dynamic(None) => {
                serializer.serialize_none()
            }
        }
    }
}
