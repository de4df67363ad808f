//! Per-connection session tracking
//!
//! The small state machine a connection moves through:
//! `AwaitingRegistration → {ProducerActive | ConsumerActive} → Closed`.

pub mod state;

pub use state::{ConnectionPhase, SessionState};
