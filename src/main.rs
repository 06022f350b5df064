use std::sync::Arc;
use relayq::{QueueStore, RelayConfig, RelayServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    // Get configuration from environment variables
    let host = std::env::var("RELAYQ_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("RELAYQ_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let max_connections = std::env::var("RELAYQ_MAX_CONNECTIONS")
        .ok()
        .and_then(|m| m.parse().ok());

    // The queue lives only in process memory and is shared by every handler
    let store = Arc::new(QueueStore::new());

    let config = RelayConfig {
        host,
        port,
        max_connections,
    };

    let server = RelayServer::new(config, store);
    server.run().await?;

    Ok(())
}
