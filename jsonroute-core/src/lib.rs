//! jsonroute core: route matching with JSON body validation, parameter
//! extraction, error redirects, documentation, HTTP server.

pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod handler_error;
pub mod http;
pub mod path;
pub mod pipeline;
pub mod response;
pub mod router;
pub mod routing;
pub mod schema;
pub mod service;
pub mod value;

pub use config::{PipelineConfig, ServerConfig};
pub use docs::ApiDocumentation;
pub use error::{ErrorKind, FormatError};
pub use extract::extract;
pub use handler_error::HandlerResultExt;
pub use path::{PathSegment, PropertyPath};
pub use pipeline::{ErrorRedirect, MatchOutcome, MatchPipeline};
pub use response::{RequestContext, Response};
pub use router::{ApiRoute, RouteId, RouteMatcher};
pub use routing::{RouteList, RouteSpec, RouteSpecification};
pub use schema::{validate, validate_json};
pub use service::{HttpService, RouterService};
pub use value::{classify, Parameters, TypeName};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// No route path matches. Status 404, not 400: the request line is
    /// well-formed, the endpoint is missing.
    #[error("The requested endpoint was not found: {0}")]
    NotFound(String),
    /// A route path matched but none of its methods did. Status 405.
    #[error("Allowed methods: {}.", .allowed.join(", "))]
    MethodNotAllowed { allowed: Vec<String> },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::MethodNotAllowed { .. } => 405,
            CoreError::Format(e) => e.status_code(),
            CoreError::Json(_) | CoreError::Handler(_) | CoreError::Config(_) | CoreError::Io(_) => {
                500
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            CoreError::Format(e) => e.error_code(),
            CoreError::Json(_) | CoreError::Handler(_) | CoreError::Config(_) | CoreError::Io(_) => {
                "INTERNAL_ERROR"
            }
        }
    }
}

/// Request callback: (resolved parameters, request) -> response. Receives the
/// error redirect descriptor instead of route parameters when a body is rejected.
pub type RequestCallback =
    Box<dyn Fn(&Parameters, &RequestContext) -> Result<Response, CoreError> + Send + Sync>;

/// Core app: routes, body pipeline, callback. Built at startup, then shared read-only.
pub struct App {
    pub routes: RouteList,
    pipeline: MatchPipeline,
    callback: Option<RequestCallback>,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            routes: RouteList::new(),
            pipeline: MatchPipeline::new(config),
            callback: None,
        }
    }

    /// Group routes under a module; presenters become `module:Presenter`.
    pub fn with_module(mut self, module: &str) -> Self {
        self.routes = RouteList::with_module(module);
        self
    }

    pub fn pipeline(&self) -> &MatchPipeline {
        &self.pipeline
    }

    pub fn register_route(&mut self, route: ApiRoute) -> RouteId {
        self.routes.add(route)
    }

    pub fn add_routes_by_specification(
        &mut self,
        specification: &RouteSpecification,
    ) -> Result<Vec<RouteId>, CoreError> {
        self.routes.add_routes_by_specification(specification)
    }

    pub fn set_callback(&mut self, cb: RequestCallback) {
        self.callback = Some(cb);
    }

    /// Resolve a request to route parameters or an error redirect, without calling the callback.
    pub fn match_request(&self, req: &RequestContext) -> Result<MatchOutcome, CoreError> {
        self.routes
            .match_request(&self.pipeline, req)
            .map(|(_, outcome)| outcome)
    }

    /// Match, check the body, and pass the resulting parameters to the callback.
    pub fn handle(&self, req: &RequestContext) -> Result<Response, CoreError> {
        let params = self.match_request(req)?.into_parameters();
        let cb = self
            .callback
            .as_ref()
            .ok_or_else(|| CoreError::Handler("no callback set".into()))?;
        cb(&params, req)
    }

    /// Handle a request without HTTP. `target` may include a query string.
    pub fn handle_request(
        &self,
        method: &str,
        target: &str,
        body: &[u8],
    ) -> Result<Response, CoreError> {
        self.handle(&RequestContext::new(method, target, body))
    }

    /// Markdown documentation of routes added from a specification.
    pub fn documentation(&self, title: &str) -> ApiDocumentation {
        ApiDocumentation::new(title, self.routes.descriptors().iter().cloned())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
