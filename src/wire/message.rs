//! Wire message types

use serde::{Deserialize, Serialize};

/// Error code sent to a producer whose topic already has a live producer.
pub const ERR_ALREADY_REGISTERED: &str = "ERR_ALREADY_REGISTERED";

/// Error code sent to a consumer whose topic has no producer.
pub const ERR_PRODUCER_UNAVAILABLE: &str = "ERR_PRODUCER_UNAVAILABLE";

/// Role a connection declares in its registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Publishes data for one topic
    Producer,
    /// Receives everything the topic's producer publishes
    Consumer,
}

impl Role {
    /// Parse the wire form of a role. Anything other than the two known
    /// role strings is rejected (case-sensitive).
    pub fn from_wire(role: &str) -> Option<Self> {
        match role {
            "PRODUCER" => Some(Role::Producer),
            "CONSUMER" => Some(Role::Consumer),
            _ => None,
        }
    }

    /// The exact string sent on the wire
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Producer => "PRODUCER",
            Role::Consumer => "CONSUMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// The first and only control message on a connection
///
/// Everything after it on a producer connection is opaque payload data;
/// everything after it on a consumer connection is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Declared role
    #[serde(rename = "type")]
    pub role: Role,
    /// Topic the connection binds to
    pub topic: String,
}

impl Registration {
    /// Create a registration for the given role and topic
    pub fn new(role: Role, topic: impl Into<String>) -> Self {
        Self {
            role,
            topic: topic.into(),
        }
    }
}

/// Envelope delivered to consumers
///
/// `error == true` means `payload` is a machine-readable error code rather
/// than data; the server sends at most one such frame before closing a
/// rejected connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub error: bool,
    pub payload: String,
}

impl Payload {
    /// Wrap a data chunk for delivery
    pub fn data(payload: impl Into<String>) -> Self {
        Self {
            error: false,
            payload: payload.into(),
        }
    }

    /// Wrap a machine-readable error code
    pub fn error(code: impl Into<String>) -> Self {
        Self {
            error: true,
            payload: code.into(),
        }
    }
}
