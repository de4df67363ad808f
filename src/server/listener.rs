//! Relay server listener
//!
//! Handles the TCP accept loop and spawns one connection task per client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::registry::{RegistryConfig, TopicRegistry};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<TopicRegistry>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            registry: Arc::new(TopicRegistry::with_config(registry_config)),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the topic registry
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// Binds the configured address and blocks until shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Serve connections from an already-bound listener.
    ///
    /// Lets callers bind port 0 first and learn the address before any
    /// client connects.
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "Relay server listening");
        }

        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit; the permit rides along with the
        // connection task and frees the slot when the task ends.
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            let _permit = permit;
            let mut connection = Connection::new(session_id, peer_addr, config, registry);

            if let Err(e) = connection.run(socket).await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    async fn start_server(config: ServerConfig) -> (Arc<RelayServer>, SocketAddr) {
        let server = Arc::new(RelayServer::new(config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let run_server = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = run_server.run_on(listener).await;
        });

        (server, addr)
    }

    #[tokio::test]
    async fn test_serves_registrations() {
        let (server, addr) = start_server(ServerConfig::default()).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(br#"{"type":"PRODUCER","topic":"live"}"#)
            .await
            .unwrap();

        let registry = Arc::clone(server.registry());
        tokio::time::timeout(Duration::from_secs(2), async move {
            while registry.topic_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("producer was never registered");
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let (server, addr) = start_server(ServerConfig::default().max_connections(1)).await;

        // First connection takes the only slot
        let mut first = TcpStream::connect(addr).await.unwrap();
        first
            .write_all(br#"{"type":"PRODUCER","topic":"full"}"#)
            .await
            .unwrap();
        let registry = Arc::clone(server.registry());
        tokio::time::timeout(Duration::from_secs(2), async move {
            while registry.topic_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("producer was never registered");

        // Second connection is dropped without a reply
        let mut second = TcpStream::connect(addr).await.unwrap();
        let mut received = Vec::new();
        second.read_to_end(&mut received).await.unwrap();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let server = RelayServer::new(ServerConfig::with_addr("127.0.0.1:0".parse().unwrap()));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let run = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = rx.await;
                })
                .await
        });

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("server did not shut down")
            .unwrap()
            .unwrap();
    }
}
