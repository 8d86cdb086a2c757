//! # Transport Errors

use thiserror::Error;

/// Failures of the transport capability.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port is closed. Expected after the peer goes away.
    #[error("Port disconnected")]
    Disconnected,

    /// Dialing the peer failed.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// An outbound message could not be serialized.
    #[error("Failed to serialize outbound message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O failure on an established port.
    #[error("Port I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True for the expected "peer went away" case.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
