//! JSON encode/decode for wire messages
//!
//! Registrations arrive as one raw read chunk, possibly NUL-padded by the
//! client library; payload frames sent to consumers are newline-terminated
//! so the receiving side can split the stream.

use super::message::{Payload, Registration, Role};

/// Error produced while encoding or decoding wire messages
#[derive(Debug)]
pub enum WireError {
    /// Input was not a valid JSON structure of the expected shape
    Malformed(serde_json::Error),
    /// Registration carried a `type` other than PRODUCER/CONSUMER
    UnknownRole(String),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::Malformed(e) => write!(f, "Malformed wire message: {}", e),
            WireError::UnknownRole(role) => write!(f, "Unknown registration role: '{}'", role),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Malformed(e) => Some(e),
            WireError::UnknownRole(_) => None,
        }
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        WireError::Malformed(e)
    }
}

/// Decode-side registration, with the role still in its raw wire form so an
/// unknown role can be told apart from malformed JSON.
#[derive(serde::Deserialize)]
struct RawRegistration {
    #[serde(rename = "type")]
    role: String,
    topic: String,
}

/// Strip NUL padding from both ends of a raw chunk.
///
/// Client libraries NUL-terminate their writes and the original fixed-size
/// read buffers left trailing NULs; nothing else is trimmed.
pub fn trim_chunk(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|b| *b != 0).unwrap_or(data.len());
    let end = data.iter().rposition(|b| *b != 0).map_or(start, |i| i + 1);
    &data[start..end]
}

/// Decode the registration chunk a client sends first.
pub fn decode_registration(data: &[u8]) -> Result<Registration, WireError> {
    let raw: RawRegistration = serde_json::from_slice(trim_chunk(data))?;
    let role = Role::from_wire(&raw.role).ok_or(WireError::UnknownRole(raw.role))?;
    Ok(Registration {
        role,
        topic: raw.topic,
    })
}

/// Encode a registration for sending.
pub fn encode_registration(registration: &Registration) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(registration)?)
}

/// Encode a payload as one newline-terminated frame.
pub fn encode_payload(payload: &Payload) -> Result<Vec<u8>, WireError> {
    let mut frame = serde_json::to_vec(payload)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Decode one payload frame (the line terminator may still be present).
pub fn decode_payload(line: &str) -> Result<Payload, WireError> {
    Ok(serde_json::from_str(line.trim_end_matches(&['\n', '\r'][..]))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_round_trip() {
        for role in [Role::Producer, Role::Consumer] {
            for topic in ["news", "", "/hello", "With Spaces", "tab\there", "nul\u{0}?"] {
                let registration = Registration::new(role, topic);
                let encoded = encode_registration(&registration).unwrap();
                let decoded = decode_registration(&encoded).unwrap();
                assert_eq!(decoded, registration);
            }
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let samples = [
            Payload::data("hi"),
            Payload::data(""),
            Payload::data("line\nbreak and \u{1}\u{2} control bytes"),
            Payload::data("unicode: célèbre 話題"),
            Payload::error("ERR_PRODUCER_UNAVAILABLE"),
        ];
        for payload in samples {
            let frame = encode_payload(&payload).unwrap();
            assert_eq!(*frame.last().unwrap(), b'\n');
            let line = std::str::from_utf8(&frame).unwrap();
            assert_eq!(decode_payload(line).unwrap(), payload);
        }
    }

    #[test]
    fn test_decode_registration_trims_nul_padding() {
        let mut chunk = br#"{"type":"PRODUCER","topic":"news"}"#.to_vec();
        chunk.resize(512, 0);
        let registration = decode_registration(&chunk).unwrap();
        assert_eq!(registration.role, Role::Producer);
        assert_eq!(registration.topic, "news");
    }

    #[test]
    fn test_decode_registration_malformed() {
        let result = decode_registration(b"not json at all");
        assert!(matches!(result, Err(WireError::Malformed(_))));

        let result = decode_registration(br#"{"topic":"news"}"#);
        assert!(matches!(result, Err(WireError::Malformed(_))));
    }

    #[test]
    fn test_decode_registration_unknown_role() {
        let result = decode_registration(br#"{"type":"OBSERVER","topic":"news"}"#);
        match result {
            Err(WireError::UnknownRole(role)) => assert_eq!(role, "OBSERVER"),
            other => panic!("expected UnknownRole, got {:?}", other),
        }
    }

    #[test]
    fn test_trim_chunk() {
        assert_eq!(trim_chunk(b"\0\0hi\0"), b"hi");
        assert_eq!(trim_chunk(b"hi"), b"hi");
        assert_eq!(trim_chunk(b"\0\0\0"), b"");
        assert_eq!(trim_chunk(b""), b"");
        // Interior NULs and surrounding whitespace are data, not padding
        assert_eq!(trim_chunk(b" a\0b "), b" a\0b ");
    }
}
