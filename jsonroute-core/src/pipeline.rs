//! Match-time body pipeline: decode, validate, extract, and map failures to
//! either a returned error or a redirect to the configured error handler.

use serde_json::{json, Value};

use crate::config::PipelineConfig;
use crate::error::{ErrorKind, FormatError};
use crate::extract::extract;
use crate::response::RequestContext;
use crate::router::RouteMatcher;
use crate::schema::validate_json;
use crate::value::Parameters;

/// Match result that replaces the route's parameters when a body is rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorRedirect {
    pub presenter: String,
    pub action: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRedirect {
    pub fn new(config: &PipelineConfig, error: &FormatError) -> Self {
        Self {
            presenter: config.error_presenter.clone(),
            action: config.error_action.clone(),
            kind: error.kind,
            message: error.message.clone(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Parameter set handed to the error handler.
    pub fn into_parameters(self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("presenter".into(), Value::String(self.presenter));
        params.insert("action".into(), Value::String(self.action));
        params.insert("secured".into(), Value::Bool(false));
        params.insert("error".into(), json!(self.kind.error_code()));
        params.insert("code".into(), json!(self.kind.status_code()));
        params.insert("message".into(), Value::String(self.message));
        params
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// Base parameters, enriched with extracted body fields when a schema applied.
    Matched(Parameters),
    Redirect(ErrorRedirect),
}

impl MatchOutcome {
    pub fn is_redirect(&self) -> bool {
        matches!(self, MatchOutcome::Redirect(_))
    }

    pub fn into_parameters(self) -> Parameters {
        match self {
            MatchOutcome::Matched(params) => params,
            MatchOutcome::Redirect(redirect) => redirect.into_parameters(),
        }
    }
}

/// Runs body checks for matched routes under one [`PipelineConfig`].
#[derive(Clone, Debug, Default)]
pub struct MatchPipeline {
    config: PipelineConfig,
}

impl MatchPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Match `req` with `matcher`, then check the body. `Ok(None)` means no match.
    pub fn run<M: RouteMatcher + ?Sized>(
        &self,
        matcher: &M,
        req: &RequestContext,
    ) -> Result<Option<MatchOutcome>, FormatError> {
        let Some(base) = matcher.match_route(&req.method, &req.path, &req.query_string) else {
            return Ok(None);
        };
        self.apply(base, matcher.body_schema(), &req.body).map(Some)
    }

    /// Check `raw_body` against `schema` and enrich `base` on success.
    /// A missing or `null` schema passes `base` through untouched.
    pub fn apply(
        &self,
        base: Parameters,
        schema: Option<&Value>,
        raw_body: &[u8],
    ) -> Result<MatchOutcome, FormatError> {
        let Some(schema) = schema.filter(|s| !s.is_null()) else {
            return Ok(MatchOutcome::Matched(base));
        };
        match validate_json(raw_body, schema) {
            Ok(body) => {
                let mut params = base;
                params.extend(extract(&body, schema));
                Ok(MatchOutcome::Matched(params))
            }
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, error: FormatError) -> Result<MatchOutcome, FormatError> {
        match error.kind {
            ErrorKind::SchemaDefinition => {
                tracing::warn!(path = %error.path, "route body schema is malformed: {}", error)
            }
            ErrorKind::InputValidation => {
                tracing::debug!(path = %error.path, "request body rejected: {}", error)
            }
        }
        if self.config.throw_errors {
            return Err(error);
        }
        Ok(MatchOutcome::Redirect(ErrorRedirect::new(&self.config, &error)))
    }
}
