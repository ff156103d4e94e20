//! JSON value classification: the six primitive categories of a decoded document.

use std::fmt;

use serde_json::Value;

/// Route parameters: path, query, and extracted body fields by name.
pub type Parameters = serde_json::Map<String, Value>;

/// Canonical type name of a JSON value.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TypeName {
    Number,
    String,
    Boolean,
    Array,
    Object,
    Null,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Number => "number",
            TypeName::String => "string",
            TypeName::Boolean => "boolean",
            TypeName::Array => "array",
            TypeName::Object => "object",
            TypeName::Null => "null",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value. Integers and floats are both `number`.
pub fn classify(value: &Value) -> TypeName {
    match value {
        Value::Null => TypeName::Null,
        Value::Bool(_) => TypeName::Boolean,
        Value::Number(_) => TypeName::Number,
        Value::String(_) => TypeName::String,
        Value::Array(_) => TypeName::Array,
        Value::Object(_) => TypeName::Object,
    }
}

/// Whether `value` is a number without a fractional part.
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}
