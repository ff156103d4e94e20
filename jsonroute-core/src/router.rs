//! Path-pattern routes: `/api/devices/<uuid>/request` with per-parameter
//! requirements, one action per HTTP method.

use regex::Regex;
use serde_json::Value;

use crate::value::Parameters;
use crate::CoreError;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

/// Resolves a request line to a base parameter set, and exposes the body schema
/// attached to the route.
pub trait RouteMatcher {
    fn match_route(&self, method: &str, path: &str, query: &str) -> Option<Parameters>;

    fn body_schema(&self) -> Option<&Value> {
        None
    }
}

const DEFAULT_REQUIREMENT: &str = "[^/]+";

/// Compiled path pattern. Placeholders are written `<name>`.
#[derive(Clone, Debug)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Parse `pattern`. A placeholder's requirement comes from
    /// `parameters[name].requirement` when present.
    pub fn parse(pattern: &str, parameters: &Parameters) -> Result<Self, CoreError> {
        let trimmed = pattern.trim_matches('/');
        let mut source = String::from("^");
        let mut names = Vec::new();
        let mut rest = trimmed;
        while let Some(open) = rest.find('<') {
            source.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after.find('>').ok_or_else(|| {
                CoreError::Config(format!("unclosed placeholder in route path {:?}", pattern))
            })?;
            let name = &after[..close];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(CoreError::Config(format!(
                    "invalid placeholder <{}> in route path {:?}",
                    name, pattern
                )));
            }
            let requirement = parameters
                .get(name)
                .and_then(|p| p.get("requirement"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_REQUIREMENT);
            source.push_str(&format!("(?P<{}>(?:{}))", name, requirement));
            names.push(name.to_owned());
            rest = &after[close + 1..];
        }
        source.push_str(&regex::escape(rest));
        source.push('$');
        let regex = Regex::new(&source).map_err(|e| {
            CoreError::Config(format!("route path {:?} does not compile: {}", pattern, e))
        })?;
        Ok(Self {
            raw: format!("/{}", trimmed),
            regex,
            names,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Percent-decoded placeholder values when `path` matches. Matching runs
    /// on the raw path, so an encoded `/` stays inside its segment.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path.trim_matches('/'))?;
        Some(
            self.names
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), decode_segment(m.as_str())))
                })
                .collect(),
        )
    }
}

/// Action used when a route lists a method without one.
pub fn default_action(method: &str) -> &'static str {
    match method {
        "POST" => "create",
        "PUT" | "PATCH" => "update",
        "DELETE" => "delete",
        "OPTIONS" => "options",
        _ => "read",
    }
}

/// A route: path pattern, presenter, method -> action table, optional body schema.
#[derive(Clone, Debug)]
pub struct ApiRoute {
    pattern: PathPattern,
    presenter: String,
    methods: Vec<(String, String)>,
    parameters: Parameters,
    body_schema: Option<Value>,
}

impl ApiRoute {
    pub fn new(path: &str, presenter: &str) -> Result<Self, CoreError> {
        Ok(Self {
            pattern: PathPattern::parse(path, &Parameters::new())?,
            presenter: presenter.to_owned(),
            methods: Vec::new(),
            parameters: Parameters::new(),
            body_schema: None,
        })
    }

    /// Allow `method`, dispatching to `action` or the method's default action.
    pub fn method(mut self, method: &str, action: Option<&str>) -> Self {
        let method = method.to_uppercase();
        let action = action.unwrap_or_else(|| default_action(&method)).to_owned();
        self.methods.retain(|(m, _)| *m != method);
        self.methods.push((method, action));
        self
    }

    /// Declare path parameters (`type`, `requirement`); recompiles the pattern.
    pub fn with_parameters(mut self, parameters: Parameters) -> Result<Self, CoreError> {
        self.pattern = PathPattern::parse(self.pattern.as_str(), &parameters)?;
        self.parameters = parameters;
        Ok(self)
    }

    /// Attach a body schema. `None` or `null` disables body checks.
    pub fn with_body_schema(mut self, schema: Option<Value>) -> Self {
        self.body_schema = schema.filter(|s| !s.is_null());
        self
    }

    /// Prefix the presenter with `module:`.
    pub fn in_module(mut self, module: &str) -> Self {
        self.presenter = format!("{}:{}", module, self.presenter);
        self
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn presenter(&self) -> &str {
        &self.presenter
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(m, _)| m.as_str())
    }

    pub fn action_for(&self, method: &str) -> Option<&str> {
        let method = method.to_uppercase();
        self.methods
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, a)| a.as_str())
    }

    /// Path and query parameters when `path` matches, ignoring the method.
    pub fn match_path(&self, path: &str, query: &str) -> Option<Parameters> {
        let mut params = Parameters::new();
        for (name, raw) in self.pattern.captures(path)? {
            let value = self.convert(&name, raw);
            params.insert(name, value);
        }
        for (name, raw) in parse_query(query) {
            params.entry(name).or_insert(Value::String(raw));
        }
        Some(params)
    }

    fn convert(&self, name: &str, raw: String) -> Value {
        let declared = self
            .parameters
            .get(name)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str);
        match declared {
            Some("integer") | Some("int") => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(raw)),
            _ => Value::String(raw),
        }
    }
}

impl RouteMatcher for ApiRoute {
    fn match_route(&self, method: &str, path: &str, query: &str) -> Option<Parameters> {
        let action = self.action_for(method)?;
        let matched = self.match_path(path, query)?;
        let mut params = Parameters::new();
        params.insert("presenter".into(), Value::String(self.presenter.clone()));
        params.insert("action".into(), Value::String(action.to_owned()));
        params.extend(matched);
        Some(params)
    }

    fn body_schema(&self) -> Option<&Value> {
        self.body_schema.as_ref()
    }
}

/// Percent-decode one path segment; undecodable input is kept as sent.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
