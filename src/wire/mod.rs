//! Wire protocol for relay connections
//!
//! The relay speaks UTF-8 JSON for its two control structures:
//!
//! - [`Registration`]: the first (and only) message a client sends,
//!   declaring its role and topic.
//! - [`Payload`]: the envelope delivered to consumers, carrying either a
//!   data chunk or a machine-readable error code.
//!
//! After the registration, a producer connection is an opaque byte stream
//! (each non-empty read becomes one payload), and a consumer connection
//! only receives newline-terminated payload frames.

pub mod codec;
pub mod message;

pub use codec::{
    decode_payload, decode_registration, encode_payload, encode_registration, trim_chunk,
    WireError,
};
pub use message::{Payload, Registration, Role, ERR_ALREADY_REGISTERED, ERR_PRODUCER_UNAVAILABLE};
