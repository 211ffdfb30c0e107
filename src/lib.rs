use std::{future::Future, io, sync::Arc};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod stdio;

use domain::tools::ToolHost;
use http::{
    handlers::{MESSAGES_PATH, SSE_PATH},
    sessions::SessionRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub tool_host: Arc<dyn ToolHost>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(tool_host: Arc<dyn ToolHost>) -> Self {
        Self {
            tool_host,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route(SSE_PATH, get(http::handlers::sse_endpoint))
        .route(MESSAGES_PATH, post(http::handlers::post_message))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

/// Serves the SSE router until `shutdown` resolves, then ends open event streams.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sessions = Arc::clone(&state.sessions);
    let app = build_app(state);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.await;
            sessions.close_all();
        })
        .await?;

    info!("sse server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
