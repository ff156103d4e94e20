//! Request body validation against a JSON Schema subset.
//!
//! Supported keywords: `type`, `enum`, `required`, `properties`,
//! `additionalProperties`, `items`, `contains`, `minLength`, `maxLength`,
//! `pattern`, and the combinators `not`, `allOf`, `anyOf`, `oneOf`.
//! `$ref`, `format` and numeric range keywords are not interpreted.
//!
//! Checks run in a fixed order at each node and the first failure is
//! returned. A malformed schema yields [`ErrorKind::SchemaDefinition`], a
//! non-conforming value yields [`ErrorKind::InputValidation`].
//!
//! [`ErrorKind::SchemaDefinition`]: crate::ErrorKind::SchemaDefinition
//! [`ErrorKind::InputValidation`]: crate::ErrorKind::InputValidation

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::path::PropertyPath;
use crate::value::{classify, is_integer};

/// Root segment of every body path.
pub const BODY_ROOT: &str = "body";

const TYPE_NAMES: [&str; 6] = ["number", "string", "boolean", "array", "object", "null"];

/// Decode a raw body. Empty or whitespace-only input decodes to `null`.
pub fn decode_body(raw: &[u8]) -> Result<Value, FormatError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw)
        .map_err(|_| FormatError::input(&PropertyPath::root(BODY_ROOT), "input is not valid JSON"))
}

/// Decode `body` and validate it against `schema`, returning the decoded value.
pub fn validate_json(body: &[u8], schema: &Value) -> Result<Value, FormatError> {
    let value = decode_body(body)?;
    validate(&value, schema, &PropertyPath::root(BODY_ROOT))?;
    Ok(value)
}

/// Validate `value` against `schema`; failures are reported at or below `path`.
pub fn validate(value: &Value, schema: &Value, path: &PropertyPath) -> Result<(), FormatError> {
    let schema = schema
        .as_object()
        .ok_or_else(|| FormatError::schema(path, format!("Schema must be an object @{}", path)))?;

    if let Some(declared) = schema.get("type") {
        check_type(value, declared, path)?;
    }
    if let Some(members) = schema.get("enum") {
        check_enum(value, members, path)?;
    }

    match value {
        Value::Object(object) => check_object(object, schema, path)?,
        Value::Array(items) => check_array(items, schema, path)?,
        Value::String(text) => check_string(text, schema, path)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }

    if let Some(excluded) = schema.get("not") {
        match validate(value, excluded, path) {
            Ok(()) => {
                return Err(FormatError::input(
                    path,
                    format!("Property @{} must not satisfy the excluded schema", path),
                ))
            }
            Err(e) if e.is_schema_error() => return Err(e),
            Err(_) => {}
        }
    }
    if let Some(branches) = schema.get("allOf") {
        for branch in subschemas("AllOf", branches, path)? {
            validate(value, branch, path)?;
        }
    }
    if let Some(branches) = schema.get("anyOf") {
        if count_satisfied(value, subschemas("AnyOf", branches, path)?, path)? == 0 {
            return Err(FormatError::input(
                path,
                format!("Property @{} does not satisfy any anyOf branch", path),
            ));
        }
    }
    if let Some(branches) = schema.get("oneOf") {
        match count_satisfied(value, subschemas("OneOf", branches, path)?, path)? {
            1 => {}
            0 => {
                return Err(FormatError::input(
                    path,
                    format!("Property @{} does not satisfy any oneOf branch", path),
                ))
            }
            n => {
                return Err(FormatError::input(
                    path,
                    format!(
                        "Property @{} satisfies {} oneOf branches, exactly one is allowed",
                        path, n
                    ),
                ))
            }
        }
    }
    Ok(())
}

fn check_type(value: &Value, declared: &Value, path: &PropertyPath) -> Result<(), FormatError> {
    let malformed =
        || FormatError::schema(path, format!("Type must be a string or an array of strings @{}", path));
    let names: Vec<&str> = match declared {
        Value::String(name) => vec![name.as_str()],
        Value::Array(entries) if !entries.is_empty() => entries
            .iter()
            .map(|entry| entry.as_str().ok_or_else(malformed))
            .collect::<Result<_, _>>()?,
        _ => return Err(malformed()),
    };

    let actual = classify(value);
    let mut matched = false;
    for name in &names {
        matched |= match *name {
            "integer" => is_integer(value),
            known if TYPE_NAMES.contains(&known) => known == actual.as_str(),
            unknown => {
                return Err(FormatError::schema(
                    path,
                    format!("Unknown type '{}' @{}", unknown, path),
                ))
            }
        };
    }
    if matched {
        Ok(())
    } else {
        Err(FormatError::input(
            path,
            format!(
                "Property @{} must be of type {}, found {}",
                path,
                names.join(" or "),
                actual
            ),
        ))
    }
}

fn check_enum(value: &Value, members: &Value, path: &PropertyPath) -> Result<(), FormatError> {
    let members = members
        .as_array()
        .ok_or_else(|| FormatError::schema(path, format!("Enum must be an array @{}", path)))?;
    if members.iter().any(|member| member == value) {
        return Ok(());
    }
    let allowed: Vec<String> = members.iter().map(Value::to_string).collect();
    Err(FormatError::input(
        path,
        format!("Property @{} must be one of {}", path, allowed.join(", ")),
    ))
}

fn check_object(
    object: &Map<String, Value>,
    schema: &Map<String, Value>,
    path: &PropertyPath,
) -> Result<(), FormatError> {
    if let Some(required) = schema.get("required") {
        let malformed = || {
            FormatError::schema(
                path,
                format!("Required properties must be an array of strings @{}", path),
            )
        };
        for name in required.as_array().ok_or_else(malformed)? {
            let name = name.as_str().ok_or_else(malformed)?;
            if !object.contains_key(name) {
                let at = path.key(name);
                return Err(FormatError::input(&at, format!("Property @{} is required", at)));
            }
        }
    }

    let properties = match schema.get("properties") {
        None => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(_) => {
            return Err(FormatError::schema(
                path,
                format!("Properties must be an object @{}", path),
            ))
        }
    };
    let additional = schema.get("additionalProperties");

    for (key, item) in object {
        let at = path.key(key);
        if let Some(rule) = properties.and_then(|p| p.get(key)) {
            validate(item, rule, &at)?;
            continue;
        }
        match additional {
            None | Some(Value::Bool(true)) => {}
            Some(Value::Bool(false)) => {
                return Err(FormatError::input(
                    &at,
                    format!("Property @{} is not allowed, additional properties are forbidden", at),
                ))
            }
            Some(rule @ Value::Object(_)) => validate(item, rule, &at)?,
            Some(_) => {
                return Err(FormatError::schema(
                    path,
                    format!("AdditionalProperties must be a boolean or a schema @{}", path),
                ))
            }
        }
    }
    Ok(())
}

fn check_array(
    items: &[Value],
    schema: &Map<String, Value>,
    path: &PropertyPath,
) -> Result<(), FormatError> {
    match schema.get("items") {
        None => {}
        Some(rule @ Value::Object(_)) => {
            for (i, item) in items.iter().enumerate() {
                validate(item, rule, &path.index(i))?;
            }
        }
        // Tuple-form `items` is not supported.
        Some(_) => {
            return Err(FormatError::schema(
                path,
                format!("Items must be a single schema @{}", path),
            ))
        }
    }

    if let Some(rule) = schema.get("contains") {
        if !rule.is_object() {
            return Err(FormatError::schema(
                path,
                format!("Contains must be a schema @{}", path),
            ));
        }
        let mut found = false;
        for (i, item) in items.iter().enumerate() {
            match validate(item, rule, &path.index(i)) {
                Ok(()) => {
                    found = true;
                    break;
                }
                Err(e) if e.is_schema_error() => return Err(e),
                Err(_) => {}
            }
        }
        if !found {
            return Err(FormatError::input(
                path,
                format!(
                    "Property @{} must contain at least one item matching the contains schema",
                    path
                ),
            ));
        }
    }
    Ok(())
}

fn check_string(
    text: &str,
    schema: &Map<String, Value>,
    path: &PropertyPath,
) -> Result<(), FormatError> {
    let length = text.chars().count();

    if let Some(min) = schema.get("minLength") {
        let min = length_limit(min)
            .ok_or_else(|| FormatError::schema(path, format!("MinLength must be integer @{}", path)))?;
        if length < min {
            return Err(FormatError::input(
                path,
                format!(
                    "Property @{} must be at least {} characters long, found {}",
                    path, min, length
                ),
            ));
        }
    }
    if let Some(max) = schema.get("maxLength") {
        let max = length_limit(max)
            .ok_or_else(|| FormatError::schema(path, format!("MaxLength must be integer @{}", path)))?;
        if length > max {
            return Err(FormatError::input(
                path,
                format!(
                    "Property @{} can be a maximum of {} characters long, found {}",
                    path, max, length
                ),
            ));
        }
    }
    if let Some(pattern) = schema.get("pattern") {
        let pattern = pattern
            .as_str()
            .ok_or_else(|| FormatError::schema(path, format!("Pattern must be a string @{}", path)))?;
        let re = compiled_pattern(pattern).map_err(|e| {
            FormatError::schema(
                path,
                format!("Pattern '{}' is not a valid regular expression @{}: {}", pattern, path, e),
            )
        })?;
        if !re.is_match(text) {
            return Err(FormatError::input(
                path,
                format!("Property @{} does not match pattern '{}'", path, pattern),
            ));
        }
    }
    Ok(())
}

/// Compiled `pattern` keywords, shared by every schema in the process.
static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let cache = PATTERNS.get_or_init(|| Mutex::new(HashMap::new()));
    if let Some(re) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(pattern.to_owned(), re.clone());
    Ok(re)
}

fn length_limit(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn subschemas<'a>(
    keyword: &str,
    branches: &'a Value,
    path: &PropertyPath,
) -> Result<&'a [Value], FormatError> {
    match branches {
        Value::Array(items) if !items.is_empty() => Ok(items),
        _ => Err(FormatError::schema(
            path,
            format!("{} must be a non-empty array of schemas @{}", keyword, path),
        )),
    }
}

/// Number of branches `value` satisfies. Schema faults in any branch propagate.
fn count_satisfied(
    value: &Value,
    branches: &[Value],
    path: &PropertyPath,
) -> Result<usize, FormatError> {
    branches
        .iter()
        .map(|branch| validate(value, branch, path))
        .try_fold(0, |count, outcome| match outcome {
            Ok(()) => Ok(count + 1),
            Err(e) if e.is_schema_error() => Err(e),
            Err(_) => Ok(count),
        })
}
