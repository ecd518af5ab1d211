use std::collections::BTreeMap;

/// A node in the nested value tree produced by encoding a form.
///
/// Scalars are strings (the raw field value) or booleans (the presence flag of
/// a value-less checkbox). `Null` fills array slots skipped by a sparse index.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    String(String),
    Array(Vec<FormValue>),
    Object(BTreeMap<String, FormValue>),
}

impl FormValue {
    /// An empty object node.
    pub fn object() -> Self {
        FormValue::Object(BTreeMap::new())
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FormValue::Null => "null",
            FormValue::Bool(_) => "a boolean",
            FormValue::String(_) => "a string",
            FormValue::Array(_) => "an array",
            FormValue::Object(_) => "an object",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FormValue::Null | FormValue::Bool(_) | FormValue::String(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, FormValue>> {
        match self {
            FormValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a property of an object node.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Truthiness used when a value drives a checkbox: `false`, `null` and
    /// the empty string are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormValue::Null => false,
            FormValue::Bool(b) => *b,
            FormValue::String(s) => !s.is_empty(),
            FormValue::Array(_) | FormValue::Object(_) => true,
        }
    }

    /// Text written into a text-like control. Containers have no text form.
    pub fn to_field_text(&self) -> Option<String> {
        match self {
            FormValue::Null => Some(String::new()),
            FormValue::Bool(b) => Some(b.to_string()),
            FormValue::String(s) => Some(s.clone()),
            FormValue::Array(_) | FormValue::Object(_) => None,
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        crate::json::to_json(self)
    }

    /// Serialize to pretty-printed JSON (2-space indent).
    pub fn to_json_pretty(&self) -> String {
        crate::json::to_json_pretty(self)
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}
