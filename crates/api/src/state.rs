use std::sync::Arc;

use pixbyt_core::runner::AppRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Runs `meltano run <app>` for the app endpoints.
    pub runner: Arc<AppRunner>,
}
