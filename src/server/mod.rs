//! Relay server
//!
//! TCP accept loop plus the per-connection protocol driver. Each accepted
//! connection runs in its own task, fully in parallel with all others; the
//! only shared state is the topic registry.

pub mod config;
mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
