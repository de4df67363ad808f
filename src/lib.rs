//! Topic-addressed publish/subscribe relay
//!
//! `relaymq` is a TCP relay: a client registers as the single producer or
//! as a consumer of a named topic, and every chunk the producer sends is
//! fanned out to the topic's current consumers as a JSON payload envelope.
//!
//! # Modules
//!
//! - [`registry`]: the core. The topic table, per-topic producer fan-out,
//!   and per-consumer delivery queues.
//! - [`server`]: TCP accept loop and the per-connection protocol driver.
//! - [`client`]: producing/consuming client library.
//! - [`wire`]: registration/payload JSON codec.
//! - [`session`]: per-connection lifecycle state.
//! - [`error`]: crate-wide error type.
//!
//! # Quick start
//!
//! ```no_run
//! use relaymq::{RelayServer, ServerConfig};
//!
//! # async fn run() -> relaymq::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run().await
//! # }
//! ```
//!
//! # Delivery semantics
//!
//! Best-effort, FIFO per consumer queue, at most one producer per topic.
//! A slow consumer never blocks the producer: its bounded queue overflows
//! according to the configured [`OverflowPolicy`].

pub mod client;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod wire;

pub use error::{Error, Result};
pub use registry::{OverflowPolicy, RegistryConfig, Topic, TopicRegistry};
pub use server::{RelayServer, ServerConfig};
