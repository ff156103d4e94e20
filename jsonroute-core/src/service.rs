//! Service protocol: one request in, one response out, independent of the server.

use std::sync::Arc;

use async_trait::async_trait;

use crate::response::{RequestContext, Response};
use crate::{App, CoreError};

/// Anything the HTTP server can drive. The server converts HTTP into a
/// [`RequestContext`], calls `call()`, and converts the [`Response`] back.
#[async_trait]
pub trait HttpService: Send + Sync {
    async fn call(&self, req: RequestContext) -> Result<Response, CoreError>;
}

/// An [`App`] as a service, plus `GET /docs` with the rendered route documentation.
pub struct RouterService {
    app: Arc<App>,
    documentation: String,
}

impl RouterService {
    pub fn new(app: Arc<App>, docs_title: &str) -> Self {
        let documentation = app.documentation(docs_title).render();
        Self { app, documentation }
    }

    pub fn app(&self) -> &App {
        &self.app
    }
}

#[async_trait]
impl HttpService for RouterService {
    async fn call(&self, req: RequestContext) -> Result<Response, CoreError> {
        if req.method == "GET" && req.path.trim_matches('/') == "docs" {
            return Ok(Response::text(
                self.documentation.clone(),
                "text/markdown; charset=utf-8",
                200,
            ));
        }
        self.app.handle(&req)
    }
}
