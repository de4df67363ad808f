//! Connection lifecycle state
//!
//! Tracks one connection from registration to teardown.

use std::net::SocketAddr;
use std::time::Instant;

use crate::registry::Topic;
use crate::wire::Role;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Waiting for the registration message
    AwaitingRegistration,
    /// Registered as the topic's producer, relaying inbound chunks
    ProducerActive,
    /// Subscribed as a consumer, delivery in progress
    ConsumerActive,
    /// Connection torn down
    Closed,
}

/// Per-connection session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: ConnectionPhase,

    /// Declared role (after a successful registration)
    pub role: Option<Role>,

    /// Topic the connection is bound to
    pub topic: Option<Topic>,

    /// Connection start time
    pub connected_at: Instant,

    /// Bytes read from the peer
    pub bytes_received: u64,

    /// Payloads pushed (producer) or delivered (consumer)
    pub payloads_relayed: u64,
}

impl SessionState {
    /// Create state for a freshly accepted connection
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: ConnectionPhase::AwaitingRegistration,
            role: None,
            topic: None,
            connected_at: Instant::now(),
            bytes_received: 0,
            payloads_relayed: 0,
        }
    }

    /// Transition to the producing phase
    pub fn start_producing(&mut self, topic: Topic) {
        if self.phase == ConnectionPhase::AwaitingRegistration {
            self.phase = ConnectionPhase::ProducerActive;
            self.role = Some(Role::Producer);
            self.topic = Some(topic);
        }
    }

    /// Transition to the consuming phase
    pub fn start_consuming(&mut self, topic: Topic) {
        if self.phase == ConnectionPhase::AwaitingRegistration {
            self.phase = ConnectionPhase::ConsumerActive;
            self.role = Some(Role::Consumer);
            self.topic = Some(topic);
        }
    }

    /// Terminal transition; any phase can close
    pub fn close(&mut self) {
        self.phase = ConnectionPhase::Closed;
    }

    /// Whether the connection reached an active role
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            ConnectionPhase::ProducerActive | ConnectionPhase::ConsumerActive
        )
    }

    /// Record bytes read from the peer
    pub fn add_bytes_received(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
    }

    /// Record one relayed payload
    pub fn add_payload_relayed(&mut self) {
        self.payloads_relayed += 1;
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
