//! ApiModule: routes of one presenter module under a common path prefix.

use std::sync::Arc;

use jsonroute_core::{ApiRoute, CoreError, Parameters};
use serde_json::Value;

use super::app::Application;
use super::{Handler, Module};

type SharedHandler = Arc<dyn Fn(&Parameters) -> Result<Value, CoreError> + Send + Sync>;

struct ModuleRoute {
    path: String,
    presenter: String,
    method: String,
    parameters: Parameters,
    body: Option<Value>,
    handler: SharedHandler,
}

/// Named group of routes. Presenters become `name:Presenter`, paths are
/// placed under `prefix` (default `/name`). Attach via `app.register(module)`.
pub struct ApiModule {
    pub name: String,
    pub prefix: String,
    routes: Vec<ModuleRoute>,
}

impl ApiModule {
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.unwrap_or(&format!("/{}", name.to_lowercase())).to_string(),
            routes: Vec::new(),
        }
    }

    /// Add a route dispatching `method` on `path` to `handler`, with an
    /// optional body schema. The action is the method's default action.
    pub fn route(
        self,
        path: &str,
        presenter: &str,
        method: &str,
        body: Option<Value>,
        handler: impl Fn(&Parameters) -> Result<Value, CoreError> + Send + Sync + 'static,
    ) -> Self {
        self.route_with_parameters(path, presenter, method, Parameters::new(), body, handler)
    }

    /// Like [`ApiModule::route`], declaring path parameters (`type`,
    /// `requirement`) for the route's placeholders.
    pub fn route_with_parameters(
        mut self,
        path: &str,
        presenter: &str,
        method: &str,
        parameters: Parameters,
        body: Option<Value>,
        handler: impl Fn(&Parameters) -> Result<Value, CoreError> + Send + Sync + 'static,
    ) -> Self {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self.routes.push(ModuleRoute {
            path: full_path,
            presenter: presenter.to_string(),
            method: method.to_string(),
            parameters,
            body,
            handler: Arc::new(handler),
        });
        self
    }
}

impl Module for ApiModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        for route in self.routes.drain(..) {
            let api_route = ApiRoute::new(&route.path, &route.presenter)?
                .method(&route.method, None)
                .with_parameters(route.parameters)?
                .with_body_schema(route.body)
                .in_module(&self.name);
            let id = app.register_route(api_route);
            // The application may add its own module prefix on registration.
            let (presenter, action) = app
                .core()
                .routes
                .get(id)
                .and_then(|r| {
                    let action = r.action_for(&route.method)?;
                    Some((r.presenter().to_string(), action.to_string()))
                })
                .ok_or_else(|| {
                    CoreError::Config(format!("route {} was not registered", route.path))
                })?;
            let shared = route.handler;
            let handler: Handler = Box::new(move |p: &Parameters| shared(p));
            app.handle(&presenter, &action, handler);
        }
        Ok(())
    }
}
