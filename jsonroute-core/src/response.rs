//! Transport-neutral request and response.

use serde_json::{json, Value};

use crate::CoreError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// One HTTP request as seen by the router.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub query_string: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RequestContext {
    /// `target` may carry a query string (`/items?page=2`).
    pub fn new(method: &str, target: &str, body: &[u8]) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method: method.to_uppercase(),
            path: path.to_owned(),
            query_string: query.to_owned(),
            headers: Vec::new(),
            body: body.to_vec(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Response {
    /// JSON payload with an explicit status code.
    pub fn json(payload: &Value, status_code: u16) -> Self {
        Self {
            status_code,
            body: payload.to_string().into_bytes(),
            content_type: Some(JSON_CONTENT_TYPE.to_owned()),
        }
    }

    pub fn text(body: impl Into<String>, content_type: &str, status_code: u16) -> Self {
        Self {
            status_code,
            body: body.into().into_bytes(),
            content_type: Some(content_type.to_owned()),
        }
    }

    /// `{error, code, message}` with the error's status code.
    pub fn from_error(error: &CoreError) -> Self {
        let code = error.status_code();
        Self::json(
            &json!({
                "error": error.error_code(),
                "code": code,
                "message": error.to_string(),
            }),
            code,
        )
    }

    pub fn json_body(&self) -> Result<Value, CoreError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
