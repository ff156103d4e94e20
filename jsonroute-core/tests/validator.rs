//! Body validation against the supported schema keywords.

use jsonroute_core::schema::{decode_body, validate, BODY_ROOT};
use jsonroute_core::{classify, ErrorKind, FormatError, PropertyPath, TypeName};
use serde_json::{json, Value};

fn check(schema: Value, body: Value) -> Result<(), FormatError> {
    validate(&body, &schema, &PropertyPath::root(BODY_ROOT))
}

fn input_error(result: Result<(), FormatError>) -> FormatError {
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InputValidation, "unexpected: {}", err);
    err
}

fn schema_error(result: Result<(), FormatError>) -> FormatError {
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SchemaDefinition, "unexpected: {}", err);
    err
}

#[test]
fn classify_covers_six_types() {
    assert_eq!(classify(&json!(1)), TypeName::Number);
    assert_eq!(classify(&json!(1.5)), TypeName::Number);
    assert_eq!(classify(&json!("x")), TypeName::String);
    assert_eq!(classify(&json!(false)), TypeName::Boolean);
    assert_eq!(classify(&json!([])), TypeName::Array);
    assert_eq!(classify(&json!({})), TypeName::Object);
    assert_eq!(classify(&Value::Null), TypeName::Null);
    assert_eq!(TypeName::Boolean.to_string(), "boolean");
}

#[test]
fn basic_types_pass() {
    let schema = json!({
        "type": "object",
        "properties": {
            "count": {"type": "number"},
            "name": {"type": "string"},
            "hasAccount": {"type": "boolean"}
        },
        "required": ["name"]
    });
    check(schema, json!({"name": "Foo Baz", "count": 123, "hasAccount": false})).unwrap();
}

#[test]
fn type_mismatch_names_expected_and_found() {
    let err = input_error(check(
        json!({"type": "object", "properties": {"count": {"type": "number"}}}),
        json!({"count": "many"}),
    ));
    assert_eq!(err.path.to_string(), "body:count");
    assert_eq!(err.message, "Property @body:count must be of type number, found string");
}

#[test]
fn type_array_accepts_any_listed_type() {
    check(json!({"type": ["string", "null"]}), Value::Null).unwrap();
    check(json!({"type": ["string", "null"]}), json!("x")).unwrap();
    let err = input_error(check(json!({"type": ["string", "null"]}), json!(3)));
    assert_eq!(err.message, "Property @body must be of type string or null, found number");
}

#[test]
fn integer_type_rejects_fractions() {
    check(json!({"type": "integer"}), json!(4)).unwrap();
    input_error(check(json!({"type": "integer"}), json!(4.5)));
}

#[test]
fn malformed_type_is_a_schema_error() {
    schema_error(check(json!({"type": ["string", 5]}), json!("x")));
    schema_error(check(json!({"type": 5}), json!("x")));
    let err = schema_error(check(json!({"type": "text"}), json!("x")));
    assert_eq!(err.message, "Unknown type 'text' @body");
}

#[test]
fn schema_must_be_an_object() {
    let err = schema_error(check(json!(["type", "string"]), json!("x")));
    assert_eq!(err.path.to_string(), "body");
}

#[test]
fn enum_uses_strict_equality() {
    let schema = json!({"enum": ["read", "write", 1]});
    check(schema.clone(), json!("read")).unwrap();
    check(schema.clone(), json!(1)).unwrap();
    input_error(check(schema.clone(), json!("1")));
    input_error(check(schema, json!(1.5)));
}

#[test]
fn enum_must_be_an_array() {
    let err = schema_error(check(json!({"enum": "read"}), json!("read")));
    assert_eq!(err.message, "Enum must be an array @body");
}

#[test]
fn missing_required_property_reports_its_path() {
    let schema = json!({
        "type": "object",
        "properties": {"address": {"type": "object", "required": ["city"]}},
        "required": ["address"]
    });
    let err = input_error(check(schema.clone(), json!({})));
    assert_eq!(err.path.to_string(), "body:address");
    assert_eq!(err.message, "Property @body:address is required");

    let err = input_error(check(schema, json!({"address": {"street": "Main"}})));
    assert_eq!(err.path.to_string(), "body:address:city");
}

#[test]
fn required_must_be_array_of_strings() {
    schema_error(check(json!({"required": "name"}), json!({"name": 1})));
    schema_error(check(json!({"required": [1]}), json!({"name": 1})));
}

#[test]
fn additional_properties_false_rejects_unknown_keys() {
    let schema = json!({
        "type": "object",
        "properties": {"name": {"type": "string"}},
        "additionalProperties": false
    });
    check(schema.clone(), json!({"name": "x"})).unwrap();
    let err = input_error(check(schema, json!({"name": "x", "admin": true})));
    assert_eq!(err.path.to_string(), "body:admin");
}

#[test]
fn additional_properties_schema_applies_to_unknown_keys() {
    let schema = json!({"type": "object", "additionalProperties": {"type": "number"}});
    check(schema.clone(), json!({"a": 1, "b": 2})).unwrap();
    let err = input_error(check(schema, json!({"a": 1, "b": "two"})));
    assert_eq!(err.path.to_string(), "body:b");
}

#[test]
fn unconstrained_keys_pass_unchecked() {
    let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
    check(schema, json!({"name": "x", "extra": [1, 2, 3]})).unwrap();
}

#[test]
fn items_errors_carry_index_and_nested_keys() {
    let schema = json!({
        "type": "object",
        "properties": {
            "address": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                }
            }
        }
    });
    let err = input_error(check(
        schema,
        json!({"address": [{"city": 7}, {"city": "Brno"}]}),
    ));
    assert_eq!(err.path.to_string(), "body:address[0]:city");
    assert_eq!(err.path.to_pointer(), "/address/0/city");
}

#[test]
fn tuple_items_are_a_schema_error() {
    schema_error(check(json!({"items": [{"type": "string"}]}), json!(["x"])));
}

#[test]
fn contains_needs_one_matching_item() {
    let schema = json!({"type": "array", "contains": {"type": "string"}});
    check(schema.clone(), json!([123, "aaa"])).unwrap();
    input_error(check(schema, json!([1, 2])));
}

#[test]
fn min_length_violation_references_both_lengths() {
    let schema = json!({
        "type": "object",
        "properties": {"login": {"type": "string", "minLength": 50}}
    });
    let err = input_error(check(schema, json!({"login": "freediver"})));
    assert_eq!(err.path.to_string(), "body:login");
    assert_eq!(
        err.message,
        "Property @body:login must be at least 50 characters long, found 9"
    );
}

#[test]
fn max_length_violation() {
    let schema = json!({"properties": {"login": {"type": "string", "maxLength": 5}}});
    let err = input_error(check(schema, json!({"login": "freediver"})));
    assert_eq!(
        err.message,
        "Property @body:login can be a maximum of 5 characters long, found 9"
    );
}

#[test]
fn non_integer_length_is_a_schema_error() {
    let schema = json!({
        "type": "object",
        "properties": {"login": {"type": "string", "minLength": "xxx"}}
    });
    let err = schema_error(check(schema, json!({"login": "freediver"})));
    assert_eq!(err.path.to_string(), "body:login");
    assert_eq!(err.message, "MinLength must be integer @body:login");
}

#[test]
fn pattern_is_searched() {
    let schema = json!({
        "properties": {"phone": {"type": "string", "pattern": r"^(\([0-9]{3}\))?[0-9]{3}-[0-9]{4}$"}}
    });
    check(schema.clone(), json!({"phone": "(888)555-1212"})).unwrap();
    let err = input_error(check(schema, json!({"phone": "(888)555-1212 ext. 532"})));
    assert_eq!(
        err.message,
        r"Property @body:phone does not match pattern '^(\([0-9]{3}\))?[0-9]{3}-[0-9]{4}$'"
    );
}

#[test]
fn invalid_pattern_is_a_schema_error() {
    schema_error(check(json!({"pattern": "(unclosed"}), json!("x")));
}

#[test]
fn not_fails_when_excluded_schema_matches() {
    let schema = json!({"not": {"type": "string"}});
    check(schema.clone(), json!(1)).unwrap();
    let err = input_error(check(schema, json!("x")));
    assert_eq!(err.message, "Property @body must not satisfy the excluded schema");
}

#[test]
fn not_propagates_schema_faults() {
    schema_error(check(json!({"not": {"enum": "x"}}), json!(1)));
}

#[test]
fn all_of_stops_at_first_failure() {
    let schema = json!({"allOf": [{"type": "string"}, {"minLength": 3}, {"maxLength": 1}]});
    check(json!({"allOf": [{"type": "string"}, {"minLength": 3}]}), json!("abc")).unwrap();
    let err = input_error(check(schema, json!("ab")));
    assert!(err.message.contains("at least 3"), "{}", err.message);
}

#[test]
fn any_of_needs_one_branch() {
    let schema = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
    check(schema.clone(), json!(1)).unwrap();
    check(schema.clone(), json!("x")).unwrap();
    let err = input_error(check(schema, json!(true)));
    assert_eq!(err.message, "Property @body does not satisfy any anyOf branch");
}

#[test]
fn one_of_needs_exactly_one_branch() {
    let schema = json!({"oneOf": [{"type": "number"}, {"type": "integer"}, {"type": "string"}]});
    check(schema.clone(), json!(1.5)).unwrap();
    check(schema.clone(), json!("x")).unwrap();
    let err = input_error(check(schema.clone(), json!(2)));
    assert_eq!(
        err.message,
        "Property @body satisfies 2 oneOf branches, exactly one is allowed"
    );
    let err = input_error(check(schema, Value::Null));
    assert_eq!(err.message, "Property @body does not satisfy any oneOf branch");
}

#[test]
fn combinators_must_be_non_empty_arrays() {
    schema_error(check(json!({"allOf": {}}), json!(1)));
    schema_error(check(json!({"anyOf": []}), json!(1)));
    schema_error(check(json!({"oneOf": [{"type": "number"}, "string"]}), json!(1)));
}

#[test]
fn type_failure_short_circuits_later_checks() {
    // A bad `enum` would be a schema fault, but the type check fails first.
    let err = input_error(check(json!({"type": "string", "enum": "x"}), json!(1)));
    assert_eq!(err.path.to_string(), "body");
}

#[test]
fn decode_treats_blank_body_as_null() {
    assert_eq!(decode_body(b"").unwrap(), Value::Null);
    assert_eq!(decode_body(b"  \n\t").unwrap(), Value::Null);
    assert_eq!(decode_body(b"null").unwrap(), Value::Null);
    let err = decode_body(b"wrong json body").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InputValidation);
    assert_eq!(err.message, "input is not valid JSON");
    assert_eq!(err.path.to_string(), "body");
}
