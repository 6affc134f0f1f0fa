//! Error module for the Rusty Neuronet library.
//!
//! Only fatal conditions are errors. Recoverable anomalies found while assembling a
//! network are warnings, see [`crate::diagnostics`].
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum NetError {
    /// Error for a missing input source.
    FileNotFound(String),
    /// Error for I/O operations.
    IOError(String),
    /// Error for an input that cannot be decoded, e.g., malformed JSON.
    InvalidFormat(String),
    /// Error for invalid parameters
    InvalidParameter(String),
    /// Error for a name already used by a neuron or a synapse of the network.
    DuplicateName(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetError::FileNotFound(e) => write!(f, "file not found: {}", e),
            NetError::IOError(e) => write!(f, "I/O error: {}", e),
            NetError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
            NetError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            NetError::DuplicateName(e) => write!(f, "Duplicate name: {}", e),
        }
    }
}

impl Error for NetError {}

impl NetError {
    /// Wrap an I/O error, singling out missing files.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => NetError::FileNotFound(path.to_string()),
            _ => NetError::IOError(format!("{}: {}", path, err)),
        }
    }
}
