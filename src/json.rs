use crate::error::CodecError;
use crate::tree::FormValue;
use serde_json::{Map, Value};

/// Serialize a value tree to a compact JSON string (no whitespace).
pub fn to_json(value: &FormValue) -> String {
    Value::from(value).to_string()
}

/// Serialize a value tree to a pretty-printed JSON string (2-space indent).
pub fn to_json_pretty(value: &FormValue) -> String {
    format!("{:#}", Value::from(value))
}

/// Parse a JSON document into a value tree.
///
/// Numbers become their decimal text, since form controls only hold text.
pub fn from_json(input: &str) -> Result<FormValue, CodecError> {
    let value: Value = serde_json::from_str(input)?;
    Ok(FormValue::from(value))
}

impl From<&FormValue> for Value {
    fn from(value: &FormValue) -> Self {
        match value {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::String(s) => Value::String(s.clone()),
            FormValue::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            FormValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::String(n.to_string()),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => FormValue::Array(items.into_iter().map(FormValue::from).collect()),
            Value::Object(map) => {
                FormValue::Object(map.into_iter().map(|(k, v)| (k, FormValue::from(v))).collect())
            }
        }
    }
}
