//! jsonroute for Rust: Application and Module on jsonroute-core.

pub mod core;

pub use core::{ApiModule, Application, Handler, Module};
pub use jsonroute_core::{
    ApiRoute, CoreError, HandlerResultExt, Parameters, PipelineConfig, Response, RouteSpec,
    RouteSpecification, ServerConfig,
};
