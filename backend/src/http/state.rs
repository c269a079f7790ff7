//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::SchedulingEngine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: SchedulingEngine,
    /// Storage handle, used directly by the health check
    pub repository: Arc<dyn FullRepository>,
}

impl AppState {
    pub fn new(engine: SchedulingEngine) -> Self {
        Self {
            repository: engine.repository(),
            engine,
        }
    }
}
