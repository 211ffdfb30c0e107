use std::sync::Arc;

use mcp_info_extractor_server::{
    config::{Config, Transport},
    domain::tools::InfoExtractor,
    logging, serve, shutdown_signal, stdio, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_args();
    let tool_host = Arc::new(InfoExtractor::new());

    match config.transport {
        Transport::Stdio => stdio::run_stdio(tool_host.as_ref()).await?,
        Transport::Sse => {
            let bind_socket = config.bind_socket()?;
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(bind_addr = %bind_socket, "sse server starting");

            serve(listener, AppState::new(tool_host), shutdown_signal()).await?;
        }
    }

    Ok(())
}
