use serde_json::Value;

use super::{Controller, ViewError};

/// Service information shown on the landing view.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomeController;

impl Controller for HomeController {
    type Model = Value;

    fn route(&self) -> &'static str {
        "/api/info"
    }

    fn bind(&self, payload: Value) -> Result<Value, ViewError> {
        Ok(payload)
    }
}
