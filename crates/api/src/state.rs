use std::sync::Arc;

use dsu_core::validation::ValidationEngine;
use dsu_db::Bins;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Storage bins of the configured engine.
    pub bins: Bins,
    pub config: Arc<ServerConfig>,
    /// Compiles schema definitions, including custom constraints.
    pub engine: Arc<ValidationEngine>,
}

impl AppState {
    pub fn new(bins: Bins, config: ServerConfig) -> Self {
        Self {
            bins,
            config: Arc::new(config),
            engine: Arc::new(ValidationEngine::new()),
        }
    }
}
