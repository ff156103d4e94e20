//! Application: registers routes with core and dispatches to Rust handlers
//! by presenter and action.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use jsonroute_core::{
    http, ApiDocumentation, ApiRoute, App, CoreError, Parameters, PipelineConfig, RequestCallback,
    RequestContext, Response, RouteId, RouteSpecification, RouterService, ServerConfig,
};
use serde_json::{json, Value};

/// Handler: receives the matched parameters (path, query, `_`-prefixed body
/// fields), returns the JSON payload of a 200 response.
pub type Handler = Box<dyn Fn(&Parameters) -> Result<Value, CoreError> + Send + Sync>;

type HandlerTable = Arc<RwLock<HashMap<(String, String), Handler>>>;

/// Application: routes in core, handlers keyed by `(presenter, action)`.
/// The core callback reads the shared table, so handlers registered after
/// the first request are still dispatched.
pub struct Application {
    pub(crate) core: App,
    pub(crate) handlers: HandlerTable,
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let handlers = HandlerTable::default();
        let mut core = App::with_config(config);
        core.set_callback(dispatcher(Arc::clone(&handlers)));
        Self { core, handlers }
    }

    /// Routes added afterwards get presenters `module:Presenter`.
    pub fn with_module(mut self, module: &str) -> Self {
        self.core = self.core.with_module(module);
        self
    }

    pub fn core(&self) -> &App {
        &self.core
    }

    /// Register a route. Its handlers are attached with [`Application::handle`].
    pub fn register_route(&mut self, route: ApiRoute) -> RouteId {
        self.core.register_route(route)
    }

    pub fn add_routes_by_specification(
        &mut self,
        specification: &RouteSpecification,
    ) -> Result<Vec<RouteId>, CoreError> {
        self.core.add_routes_by_specification(specification)
    }

    /// Attach `handler` to `presenter` (as it appears in matched parameters,
    /// module prefix included) and `action`. Replaces an earlier handler.
    pub fn handle(&mut self, presenter: &str, action: &str, handler: Handler) -> &mut Self {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((presenter.to_owned(), action.to_owned()), handler);
        self
    }

    /// Register a module (routes plus handlers).
    pub fn register(&mut self, module: &mut dyn crate::core::Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    /// Handle one request (for tests or when HTTP is external).
    pub fn handle_request(
        &self,
        method: &str,
        target: &str,
        body: &[u8],
    ) -> Result<Response, CoreError> {
        self.core.handle_request(method, target, body)
    }

    /// Markdown documentation of the routes added from specifications.
    pub fn documentation(&self, title: &str) -> ApiDocumentation {
        self.core.documentation(title)
    }

    /// Run the HTTP server (blocks). Serves routes and `GET /docs`.
    pub fn run(
        self,
        config: &ServerConfig,
        docs_title: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let service = RouterService::new(Arc::new(self.core), docs_title);
        http::run(Arc::new(service), config)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Core callback: the handler for the matched presenter/action, else the
/// status response of an unhandled redirect, else NotFound.
fn dispatcher(handlers: HandlerTable) -> RequestCallback {
    Box::new(move |params: &Parameters, _req: &RequestContext| {
        let presenter = params.get("presenter").and_then(Value::as_str).unwrap_or_default();
        let action = params.get("action").and_then(Value::as_str).unwrap_or_default();
        let table = handlers.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = table.get(&(presenter.to_owned(), action.to_owned())) {
            return Ok(Response::json(&handler(params)?, 200));
        }
        if let Some(response) = status_response(params) {
            return Ok(response);
        }
        Err(CoreError::NotFound(format!("no handler for {}:{}", presenter, action)))
    })
}

/// JSON status response for an error redirect nobody handles:
/// `{error, code, message}` with `code` as the HTTP status.
fn status_response(params: &Parameters) -> Option<Response> {
    let error = params.get("error")?.as_str()?;
    let code = params.get("code")?.as_u64().and_then(|c| u16::try_from(c).ok())?;
    let message = params.get("message").cloned().unwrap_or(Value::Null);
    Some(Response::json(
        &json!({"error": error, "code": code, "message": message}),
        code,
    ))
}
