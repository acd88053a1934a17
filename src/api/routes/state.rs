use std::sync::Arc;

use crate::activities::ActivityRegistry;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ActivityRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<ActivityRegistry>) -> Self {
        Self { registry }
    }
}
