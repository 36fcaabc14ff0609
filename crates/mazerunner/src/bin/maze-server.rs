//! Runs a maze server configured from the environment.
//!
//! ```text
//! RUST_LOG=debug PORT=9000 TRANSPORT=websocket cargo run --bin maze-server
//! ```

use mazerunner::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.bind_addr(),
        transport = %config.transport,
        wire_format = %config.wire_format,
        max_connections = config.max_connections,
        maps_dir = %config.maps_dir.display(),
        "starting maze server"
    );

    let builder = MazeServerBuilder::from_config(&config);
    match (config.transport, config.wire_format) {
        (TransportKind::Tcp, WireFormat::Text) => {
            run_until_ctrl_c(builder.build_tcp(TextCodec).await?).await?
        }
        (TransportKind::Tcp, WireFormat::Json) => {
            run_until_ctrl_c(builder.build_tcp(JsonCodec).await?).await?
        }
        (TransportKind::WebSocket, WireFormat::Text) => {
            run_until_ctrl_c(builder.build_websocket(TextCodec).await?).await?
        }
        (TransportKind::WebSocket, WireFormat::Json) => {
            run_until_ctrl_c(builder.build_websocket(JsonCodec).await?).await?
        }
    }

    Ok(())
}

async fn run_until_ctrl_c<T: Transport, C: Codec>(
    server: MazeServer<T, C>,
) -> Result<(), MazeServerError> {
    tracing::info!(addr = ?server.local_addr().ok(), "listening");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
