//! Copy validated body fields into route parameters.

use serde_json::Value;

use crate::value::Parameters;

/// Prefix that keeps body fields apart from path and query parameters.
pub const BODY_PARAMETER_PREFIX: &str = "_";

/// For each top-level key declared in `schema.properties` and present in
/// `body`, map `_key` to the body's value. Call only after validation passed.
pub fn extract(body: &Value, schema: &Value) -> Parameters {
    let mut out = Parameters::new();
    let (Some(body), Some(properties)) = (
        body.as_object(),
        schema.get("properties").and_then(Value::as_object),
    ) else {
        return out;
    };
    for key in properties.keys() {
        if let Some(value) = body.get(key) {
            out.insert(format!("{}{}", BODY_PARAMETER_PREFIX, key), value.clone());
        }
    }
    out
}
