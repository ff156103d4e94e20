//! Turn handler-side failures into CoreError::Handler with context.

use std::fmt::Display;

use crate::CoreError;

/// `.context("loading orders")?` inside handlers and tooling.
pub trait HandlerResultExt<T> {
    fn context(self, context: &str) -> Result<T, CoreError>;
}

impl<T, E: Display> HandlerResultExt<T> for Result<T, E> {
    fn context(self, context: &str) -> Result<T, CoreError> {
        self.map_err(|e| CoreError::Handler(format!("{}: {}", context, e)))
    }
}

impl<T> HandlerResultExt<T> for Option<T> {
    fn context(self, context: &str) -> Result<T, CoreError> {
        self.ok_or_else(|| CoreError::Handler(context.to_owned()))
    }
}
