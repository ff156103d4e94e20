//! Markdown API documentation rendered from route descriptors.

use serde::Serialize;
use serde_json::Value;

use crate::routing::RouteSpec;

pub struct ApiDocumentation {
    title: String,
    calls: Vec<RouteSpec>,
    documentation: Option<String>,
}

impl ApiDocumentation {
    pub fn new(title: &str, calls: impl IntoIterator<Item = RouteSpec>) -> Self {
        Self {
            title: title.to_owned(),
            calls: calls.into_iter().collect(),
            documentation: None,
        }
    }

    pub fn add_call(&mut self, call: RouteSpec) -> &mut Self {
        self.calls.push(call);
        self
    }

    pub fn create_documentation(&mut self) {
        self.documentation = Some(self.render());
    }

    /// Cached rendering; `recreate` forces a fresh one.
    pub fn get_documentation(&mut self, recreate: bool) -> &str {
        if recreate || self.documentation.is_none() {
            self.create_documentation();
        }
        self.documentation.as_deref().unwrap_or_default()
    }

    pub fn render(&self) -> String {
        let calls: Vec<String> = self.calls.iter().map(document_call).collect();
        format!("# {}\n\n{}\n", self.title, calls.join("\n\n"))
    }
}

fn document_call(call: &RouteSpec) -> String {
    let mut out = format!(
        "## {}\n\n{}\n\n**URL**: `{}`\n\n**Method**: {}",
        call.title, call.description, call.path, call.method
    );
    let parameters = call.parameters.clone().map(Value::Object);
    for (label, block) in [
        ("Parameters", parameters.as_ref()),
        ("Body", call.body.as_ref()),
        ("Response", call.response.as_ref()),
    ] {
        if let Some(value) = block.filter(|v| !is_empty(v)) {
            out.push_str(&format!("\n\n**{}**:\n\n```json\n{}\n```", label, pretty(value)));
        }
    }
    out
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Four-space indented JSON.
fn pretty(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}
