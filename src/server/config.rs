//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Socket read chunk size; each non-empty producer read of up to this
    /// many bytes becomes one payload
    pub read_buffer_size: usize,

    /// The registration message must arrive within this time
    pub registration_timeout: Duration,

    /// Disconnect a producer that sends nothing for this long
    /// (zero = disabled)
    pub idle_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3333".parse().unwrap(),
            max_connections: 0, // Unlimited
            read_buffer_size: 512,
            registration_timeout: Duration::from_secs(10),
            idle_timeout: Duration::ZERO, // Disabled
            tcp_nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the read chunk size (minimum 64 bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(64);
        self
    }

    /// Set the registration timeout
    pub fn registration_timeout(mut self, timeout: Duration) -> Self {
        self.registration_timeout = timeout;
        self
    }

    /// Set the producer idle timeout (zero disables it)
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 3333);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.read_buffer_size, 512);
        assert_eq!(config.registration_timeout, Duration::from_secs(10));
        assert!(config.idle_timeout.is_zero());
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:3334".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 3334);
    }

    #[test]
    fn test_builder_bind() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = ServerConfig::default().bind(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_max_connections() {
        let config = ServerConfig::default().max_connections(100);

        assert_eq!(config.max_connections, 100);
    }

    #[test]
    fn test_builder_read_buffer_size_floor() {
        let config = ServerConfig::default().read_buffer_size(1);

        assert_eq!(config.read_buffer_size, 64);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:3333".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .read_buffer_size(4096)
            .registration_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.registration_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }
}
