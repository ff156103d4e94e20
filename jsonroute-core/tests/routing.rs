//! Route lists, path patterns, and route specifications.

use jsonroute_core::{
    ApiRoute, CoreError, MatchOutcome, MatchPipeline, Parameters, RequestContext, RouteList,
    RouteMatcher, RouteSpecification,
};
use serde_json::json;

const SPECIFICATION: &str = r#"{
    "device.request": {
        "path": "/api/devices/<uuid>/request",
        "presenter": "DeviceRequest",
        "method": "POST",
        "action": "create",
        "parameters": {
            "uuid": {"type": "string", "requirement": "[0-9a-f-]+"}
        },
        "body": {
            "type": "object",
            "properties": {
                "type": {"type": "string", "enum": ["status", "ping"]},
                "data": {"type": "object"}
            },
            "required": ["type"]
        },
        "title": "Device request",
        "description": "Send a request to a device."
    },
    "device.read": {
        "path": "/api/devices/<id>",
        "presenter": "Device",
        "method": "GET",
        "parameters": {"id": {"type": "integer", "requirement": "\\d+"}},
        "body": null
    }
}"#;

fn params(value: serde_json::Value) -> Parameters {
    value.as_object().cloned().unwrap()
}

fn matched(outcome: MatchOutcome) -> Parameters {
    match outcome {
        MatchOutcome::Matched(params) => params,
        MatchOutcome::Redirect(r) => panic!("unexpected redirect: {:?}", r),
    }
}

#[test]
fn route_matches_method_and_placeholders() {
    let route = ApiRoute::new("/api/users/<id>", "Users")
        .unwrap()
        .method("get", None)
        .method("PUT", Some("replace"));
    assert_eq!(route.path(), "/api/users/<id>");
    assert_eq!(route.action_for("GET"), Some("read"));
    assert_eq!(route.action_for("put"), Some("replace"));
    assert_eq!(route.action_for("DELETE"), None);

    let p = route.match_route("GET", "/api/users/42", "").unwrap();
    assert_eq!(p["presenter"], json!("Users"));
    assert_eq!(p["action"], json!("read"));
    assert_eq!(p["id"], json!("42"));
    assert!(route.match_route("GET", "/api/users/42/extra", "").is_none());
    assert!(route.match_route("DELETE", "/api/users/42", "").is_none());
}

#[test]
fn default_actions_follow_the_method() {
    let route = ApiRoute::new("/things", "Things")
        .unwrap()
        .method("POST", None)
        .method("PATCH", None)
        .method("DELETE", None)
        .method("OPTIONS", None);
    assert_eq!(route.action_for("POST"), Some("create"));
    assert_eq!(route.action_for("PATCH"), Some("update"));
    assert_eq!(route.action_for("DELETE"), Some("delete"));
    assert_eq!(route.action_for("OPTIONS"), Some("options"));
}

#[test]
fn requirements_and_types_shape_path_parameters() {
    let route = ApiRoute::new("/items/<id>", "Items")
        .unwrap()
        .method("GET", None)
        .with_parameters(params(json!({"id": {"type": "integer", "requirement": "\\d+"}})))
        .unwrap();
    assert!(route.match_route("GET", "/items/abc", "").is_none());
    let p = route.match_route("GET", "/items/7", "page=2&id=9").unwrap();
    assert_eq!(p["id"], json!(7));
    assert_eq!(p["page"], json!("2"));
}

#[test]
fn unclosed_placeholder_is_rejected() {
    assert!(matches!(
        ApiRoute::new("/items/<id", "Items"),
        Err(CoreError::Config(_))
    ));
}

#[test]
fn specification_builds_routes_with_body_schema() {
    let spec = RouteSpecification::from_json_str(SPECIFICATION).unwrap();
    assert_eq!(spec.len(), 2);
    let names: Vec<&str> = spec.iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["device.request", "device.read"]);

    let mut list = RouteList::with_module("Api");
    let ids = list.add_routes_by_specification(&spec).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(list.descriptors().len(), 2);
    assert_eq!(list.get(ids[0]).unwrap().presenter(), "Api:DeviceRequest");
    assert!(list.get(ids[1]).unwrap().body_schema().is_none());

    let pipeline = MatchPipeline::default();
    let req = RequestContext::new(
        "POST",
        "/api/devices/ab-12/request",
        br#"{"type": "status", "data": {"verbose": true}}"#,
    );
    let (id, outcome) = list.match_request(&pipeline, &req).unwrap();
    assert_eq!(id, ids[0]);
    let p = matched(outcome);
    assert_eq!(p["presenter"], json!("Api:DeviceRequest"));
    assert_eq!(p["action"], json!("create"));
    assert_eq!(p["uuid"], json!("ab-12"));
    assert_eq!(p["_type"], json!("status"));
    assert_eq!(p["_data"], json!({"verbose": true}));

    let req = RequestContext::new("GET", "/api/devices/15", b"");
    let p = matched(list.match_request(&pipeline, &req).unwrap().1);
    assert_eq!(p["presenter"], json!("Api:Device"));
    assert_eq!(p["id"], json!(15));
}

#[test]
fn invalid_body_on_matched_route_redirects() {
    let spec = RouteSpecification::from_json_str(SPECIFICATION).unwrap();
    let mut list = RouteList::new();
    list.add_routes_by_specification(&spec).unwrap();
    let req = RequestContext::new("POST", "/api/devices/ab/request", br#"{"type": "reboot"}"#);
    let (_, outcome) = list.match_request(&MatchPipeline::default(), &req).unwrap();
    let p = outcome.into_parameters();
    assert_eq!(p["presenter"], json!("Error"));
    assert_eq!(p["error"], json!("INVALID_FORMAT"));
}

#[test]
fn wrong_method_lists_allowed_methods() {
    let mut list = RouteList::new();
    list.add(ApiRoute::new("/users", "Users").unwrap().method("POST", None));
    list.add(
        ApiRoute::new("/users", "Users")
            .unwrap()
            .method("GET", None)
            .method("POST", Some("import")),
    );
    let err = list
        .match_request(&MatchPipeline::default(), &RequestContext::new("DELETE", "/users", b""))
        .unwrap_err();
    assert_eq!(err.status_code(), 405);
    assert_eq!(err.error_code(), "METHOD_NOT_ALLOWED");
    assert_eq!(err.to_string(), "Allowed methods: GET, POST.");
}

#[test]
fn first_matching_route_wins() {
    let mut list = RouteList::new();
    let first = list.add(ApiRoute::new("/users/<name>", "ByName").unwrap().method("GET", None));
    list.add(ApiRoute::new("/users/me", "Me").unwrap().method("GET", None));
    let (id, _) = list
        .match_request(&MatchPipeline::default(), &RequestContext::new("GET", "/users/me", b""))
        .unwrap();
    assert_eq!(id, first);
}

#[test]
fn unknown_path_is_not_found() {
    let list = RouteList::new();
    let err = list
        .match_request(&MatchPipeline::default(), &RequestContext::new("GET", "/nope/", b""))
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.to_string(), "The requested endpoint was not found: GET /nope");
}

#[test]
fn broken_specification_entry_is_a_config_error() {
    let err = RouteSpecification::from_json_str(r#"{"x": {"path": "/x"}}"#).unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
    assert!(RouteSpecification::from_json_str("[]").is_err());
}

#[test]
fn path_and_query_values_are_percent_decoded() {
    let route = ApiRoute::new("/users/<name>", "Users")
        .unwrap()
        .method("GET", None);
    let p = route
        .match_route("GET", "/users/john%20doe", "q=a%26b&tag=x+y&empty")
        .unwrap();
    assert_eq!(p["name"], json!("john doe"));
    assert_eq!(p["q"], json!("a&b"));
    assert_eq!(p["tag"], json!("x y"));
    assert_eq!(p["empty"], json!(""));

    // An encoded slash stays inside its segment.
    let p = route.match_route("GET", "/users/a%2Fb", "").unwrap();
    assert_eq!(p["name"], json!("a/b"));
}

#[test]
fn decoded_integer_parameters_convert() {
    let route = ApiRoute::new("/items/<id>", "Items")
        .unwrap()
        .method("GET", None)
        .with_parameters(params(json!({"id": {"type": "integer"}})))
        .unwrap();
    let p = route.match_route("GET", "/items/%34%32", "").unwrap();
    assert_eq!(p["id"], json!(42));
}
