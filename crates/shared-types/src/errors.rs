//! # Error Types
//!
//! Errors raised while mapping between typed events and wire messages.

use thiserror::Error;

/// Errors from catalog lookups and argument encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The topic name is not part of the catalog.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// The argument list has the wrong length for the topic.
    #[error("Topic {topic} expects {expected} argument(s), received {actual}")]
    Arity {
        topic: String,
        expected: usize,
        actual: usize,
    },

    /// An argument does not match the type declared for the topic.
    #[error("Argument shape mismatch for {topic}: {reason}")]
    ArgumentShape { topic: String, reason: String },

    /// The peer speaks a different catalog version.
    #[error("Unsupported catalog version: received {received}, supported {supported}")]
    VersionMismatch { received: u16, supported: u16 },

    /// The raw message is not a wire message at all.
    #[error("Malformed wire message: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// True if the error came from an unknown topic name.
    #[must_use]
    pub fn is_unknown_topic(&self) -> bool {
        matches!(self, Self::UnknownTopic(_))
    }
}
