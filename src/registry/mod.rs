//! Topic registry and fan-out broadcaster
//!
//! The core of the relay: a process-wide table mapping each topic to its
//! single live producer, and the per-producer fan-out to subscribed
//! consumers.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<TopicRegistry>
//!                 ┌─────────────────────────┐
//!                 │ topics: HashMap<Topic,  │
//!                 │   Arc<Producer> {       │
//!                 │     subscribers,        │
//!                 │   }                     │
//!                 │ >                       │
//!                 └───────────┬─────────────┘
//!                             │
//!       ┌─────────────────────┼─────────────────────┐
//!       │                     │                     │
//!       ▼                     ▼                     ▼
//!  [Producer conn]       [Consumer conn]       [Consumer conn]
//!  push(payload)         delivery task          delivery task
//!       │                     ▲                     ▲
//!       └──► try_send ──► bounded queue ──► sink ──► TCP
//! ```
//!
//! # Concurrency contract
//!
//! The registry map is guarded by one lock, held only for map access.
//! Each producer serializes subscriber-set mutation against delivery with
//! its own lock, and each consumer owns one bounded queue whose closure is
//! the shutdown signal for its delivery task. Pushes never block on a
//! slow subscriber; a full queue falls to the configured
//! [`OverflowPolicy`].

pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod store;
pub mod topic;

pub use config::{OverflowPolicy, RegistryConfig};
pub use consumer::{Consumer, ConsumerId};
pub use error::RegistryError;
pub use producer::Producer;
pub use store::{TopicRegistry, TopicStats};
pub use topic::Topic;
