//! Process-wide settings, read once at startup.

use crate::CoreError;

pub const ENV_ERROR_PRESENTER: &str = "JSONROUTE_ERROR_PRESENTER";
pub const ENV_ERROR_ACTION: &str = "JSONROUTE_ERROR_ACTION";
pub const ENV_THROW_ERRORS: &str = "JSONROUTE_THROW_ERRORS";

/// How body format failures leave the match pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PipelineConfig {
    /// Presenter that receives redirected format errors.
    pub error_presenter: String,
    /// Action on `error_presenter`.
    pub error_action: String,
    /// Return failures to the caller instead of redirecting to the error handler.
    pub throw_errors: bool,
}

impl PipelineConfig {
    /// Defaults overridden by `JSONROUTE_ERROR_PRESENTER`, `JSONROUTE_ERROR_ACTION`
    /// and `JSONROUTE_THROW_ERRORS`.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = Self::default();
        if let Ok(presenter) = std::env::var(ENV_ERROR_PRESENTER) {
            config.error_presenter = presenter;
        }
        if let Ok(action) = std::env::var(ENV_ERROR_ACTION) {
            config.error_action = action;
        }
        if let Ok(flag) = std::env::var(ENV_THROW_ERRORS) {
            config.throw_errors = parse_flag(&flag).ok_or_else(|| {
                CoreError::Config(format!("{} must be a boolean, got {:?}", ENV_THROW_ERRORS, flag))
            })?;
        }
        Ok(config)
    }

    pub fn with_error_handler(mut self, presenter: &str, action: &str) -> Self {
        self.error_presenter = presenter.to_owned();
        self.error_action = action.to_owned();
        self
    }

    pub fn throwing(mut self, throw_errors: bool) -> Self {
        self.throw_errors = throw_errors;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            error_presenter: "Error".to_owned(),
            error_action: "error".to_owned(),
            throw_errors: false,
        }
    }
}

/// Listen address for the built-in HTTP server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Reads `HOST` and `PORT`, falling back to the given defaults.
    pub fn from_env(default_host: &str, default_port: u16) -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| default_host.to_owned());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_port);
        Self { host, port }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
