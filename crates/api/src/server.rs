//! Server lifecycle: scheduler gate, listener, graceful shutdown.
//!
//! The scheduler is a scoped resource owned by [`Server`]. It is acquired in
//! [`Server::start`] before the listener is bound and released in
//! [`Server::serve`] once the HTTP server has drained, or in
//! [`Server::start`] itself if binding fails.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use pixbyt_core::error::CoreError;
use pixbyt_core::launcher::Launcher;
use pixbyt_core::runner::AppRunner;
use pixbyt_core::scheduler::Scheduler;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::router::build_app_router;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Scheduler startup or another process-level failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// A bound server whose scheduler (if enabled) has passed its startup gate.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    router: Router,
    scheduler: Option<Scheduler>,
}

impl Server {
    /// Start the scheduler (when enabled) and bind the listener.
    ///
    /// The listener is only bound after the scheduler bootstrap exits
    /// successfully; a scheduler failure returns before any socket exists.
    pub async fn start(config: ServerConfig) -> Result<Self, ServerError> {
        let launcher = Launcher::from_command_line(&config.meltano_command, &config.project_root);

        let scheduler = if config.run_scheduler {
            Some(Scheduler::start(&launcher).await?)
        } else {
            tracing::info!("Scheduler disabled");
            None
        };

        let addr = format!("{}:{}", config.host, config.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                if let Some(scheduler) = scheduler {
                    if let Err(err) = scheduler.stop().await {
                        tracing::error!(error = %err, "Failed to stop scheduler after bind failure");
                    }
                }
                return Err(ServerError::Bind { addr, source });
            }
        };

        let state = AppState {
            config: Arc::new(config),
            runner: Arc::new(AppRunner::new(launcher)),
        };

        Ok(Self {
            listener,
            router: build_app_router(state),
            scheduler,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Whether a scheduler is being tracked for this server.
    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Serve requests until `shutdown` resolves, then stop the scheduler.
    ///
    /// The scheduler is stopped even when serving fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            listener,
            router,
            scheduler,
        } = self;

        tracing::info!(addr = ?listener.local_addr().ok(), "Starting server");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve);

        tracing::info!("Server stopped accepting connections, cleaning up");

        if let Some(scheduler) = scheduler {
            scheduler.stop().await?;
        }

        served
    }
}
