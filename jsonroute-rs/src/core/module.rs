//! Module: register routes and handlers into an Application.

use jsonroute_core::CoreError;

use super::app::Application;

pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}
