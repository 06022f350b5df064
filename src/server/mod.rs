// Relay server: TCP listener loop and per-connection handlers.

pub mod handler;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::queue::QueueStore;

use self::handler::handle_connection;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Optional cap on concurrent connection handlers. `None` spawns one
    /// handler per accepted connection with no bound.
    pub max_connections: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_connections: None,
        }
    }
}

/// Relay server
pub struct RelayServer {
    config: RelayConfig,
    store: Arc<QueueStore>,
}

impl RelayServer {
    pub fn new(config: RelayConfig, store: Arc<QueueStore>) -> Self {
        Self { config, store }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("relayq server listening on {}", addr);

        self.serve(listener).await
    }

    /// Accept loop on an already-bound listener. Split from [`run`] so tests
    /// can bind an ephemeral port first.
    ///
    /// [`run`]: RelayServer::run
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let limiter = self
            .config
            .max_connections
            .map(|n| Arc::new(Semaphore::new(n)));

        loop {
            let (socket, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    // Transient accept failures must not take the loop down.
                    tracing::error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            tracing::debug!("New connection from {}", peer_addr);

            // The semaphore is never closed, so acquire only fails if the
            // limiter is absent.
            let permit = match &limiter {
                Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
                None => None,
            };

            let store = self.store.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, store).await {
                    tracing::error!("Connection error from {}: {}", peer_addr, e);
                }
                drop(permit);
            });
        }
    }
}
