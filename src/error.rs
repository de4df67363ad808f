//! Crate-wide error type

use crate::registry::RegistryError;
use crate::wire::WireError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for server and client operations
///
/// Every variant is terminal for the connection it occurred on; nothing is
/// retried and nothing crashes the process.
#[derive(Debug)]
pub enum Error {
    /// Transport failure (read/write/accept)
    Io(std::io::Error),
    /// Invalid wire data
    Wire(WireError),
    /// Topic registration or lookup failure
    Registry(RegistryError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Wire(e) => write!(f, "Wire error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Wire(e) => Some(e),
            Error::Registry(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Error::Wire(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}
