//! Core: Application, Module, ApiModule.

pub mod app;
pub mod module;
pub mod routing;

pub use app::{Application, Handler};
pub use module::Module;
pub use routing::ApiModule;
