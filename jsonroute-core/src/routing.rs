//! RouteList: ordered routes, optionally grouped under a module name, built
//! by hand or from a route specification file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::{MatchOutcome, MatchPipeline};
use crate::response::RequestContext;
use crate::router::{ApiRoute, RouteId};
use crate::value::Parameters;
use crate::CoreError;

/// One entry of a route specification. Also the descriptor documentation is rendered from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    pub presenter: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Body schema; `null` or absent disables body checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl RouteSpec {
    pub fn to_route(&self) -> Result<ApiRoute, CoreError> {
        ApiRoute::new(&self.path, &self.presenter)?
            .method(&self.method, self.action.as_deref())
            .with_parameters(self.parameters.clone().unwrap_or_default())
            .map(|route| route.with_body_schema(self.body.clone()))
    }
}

/// Named route specs in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteSpecification {
    entries: Vec<(String, RouteSpec)>,
}

impl RouteSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping route names to route specs.
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let raw: serde_json::Map<String, Value> = serde_json::from_str(text)?;
        let mut spec = Self::new();
        for (name, entry) in raw {
            let route: RouteSpec = serde_json::from_value(entry)
                .map_err(|e| CoreError::Config(format!("route {:?}: {}", name, e)))?;
            spec.push(name, route);
        }
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn push(&mut self, name: impl Into<String>, route: RouteSpec) -> &mut Self {
        self.entries.push((name.into(), route));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteSpec)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered routes. The first route matching path and method wins.
#[derive(Clone, Debug, Default)]
pub struct RouteList {
    module: Option<String>,
    routes: Vec<(RouteId, ApiRoute)>,
    descriptors: Vec<RouteSpec>,
    next_route_id: u32,
}

impl RouteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presenters of routes added afterwards are prefixed `module:`.
    pub fn with_module(module: &str) -> Self {
        Self {
            module: Some(module.to_owned()),
            ..Self::default()
        }
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn add(&mut self, route: ApiRoute) -> RouteId {
        let route = match &self.module {
            Some(module) => route.in_module(module),
            None => route,
        };
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        tracing::debug!(route_id = id.0, path = route.path(), "route registered");
        self.routes.push((id, route));
        id
    }

    /// Add one route per spec entry and keep the entries for documentation.
    pub fn add_routes_by_specification(
        &mut self,
        specification: &RouteSpecification,
    ) -> Result<Vec<RouteId>, CoreError> {
        let mut ids = Vec::with_capacity(specification.len());
        for (_, spec) in specification.iter() {
            ids.push(self.add(spec.to_route()?));
            self.descriptors.push(spec.clone());
        }
        Ok(ids)
    }

    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &ApiRoute)> {
        self.routes.iter().map(|(id, r)| (*id, r))
    }

    pub fn get(&self, id: RouteId) -> Option<&ApiRoute> {
        self.routes.iter().find(|(rid, _)| *rid == id).map(|(_, r)| r)
    }

    /// Specs the routes were built from, for documentation.
    pub fn descriptors(&self) -> &[RouteSpec] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `req` to a route and run its body through `pipeline`.
    pub fn match_request(
        &self,
        pipeline: &MatchPipeline,
        req: &RequestContext,
    ) -> Result<(RouteId, MatchOutcome), CoreError> {
        let mut allowed: Vec<String> = Vec::new();
        for (id, route) in &self.routes {
            if route.action_for(&req.method).is_none() {
                if route.match_path(&req.path, "").is_some() {
                    allowed.extend(route.methods().map(String::from));
                }
                continue;
            }
            if let Some(outcome) = pipeline.run(route, req)? {
                tracing::debug!(
                    route_id = id.0,
                    path = route.path(),
                    redirect = outcome.is_redirect(),
                    "request matched"
                );
                return Ok((*id, outcome));
            }
        }
        if !allowed.is_empty() {
            allowed.sort_unstable();
            allowed.dedup();
            return Err(CoreError::MethodNotAllowed { allowed });
        }
        Err(CoreError::NotFound(format!("{} /{}", req.method, req.path.trim_matches('/'))))
    }
}
