//! # Bus Errors
//!
//! Errors surfaced by bus operations and by individual handlers.

use shared_types::CatalogError;
use thiserror::Error;

/// Errors returned to callers of `on`/`emit`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The topic name is not part of the bus's catalog.
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// The bus was destroyed.
    #[error("Bus closed")]
    Closed,

    /// The arguments do not match the topic's declared shape.
    #[error("Decode failed: {0}")]
    Decode(CatalogError),

    /// The event could not be encoded for the transport.
    #[error("Encode failed: {0}")]
    Encode(CatalogError),

    /// The transport failed for a reason other than disconnection.
    #[error("Transport failed: {0}")]
    Transport(String),
}

impl From<CatalogError> for BusError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownTopic(name) => Self::InvalidTopic(name),
            other => Self::Decode(other),
        }
    }
}

/// Failure of a single handler during dispatch.
///
/// Never propagated to the emitter; collected in a
/// [`DispatchReport`](crate::DispatchReport) and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("Handler {subscription} for {topic} failed: {message}")]
    Failed {
        topic: &'static str,
        subscription: u64,
        message: String,
    },

    /// The handler panicked.
    #[error("Handler {subscription} for {topic} panicked: {message}")]
    Panicked {
        topic: &'static str,
        subscription: u64,
        message: String,
    },
}

impl HandlerError {
    /// Topic the failing handler was registered on.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Failed { topic, .. } | Self::Panicked { topic, .. } => topic,
        }
    }
}
