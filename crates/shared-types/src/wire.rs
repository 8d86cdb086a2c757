//! # Wire Format
//!
//! Every message crossing the port is a JSON object:
//!
//! ```text
//! {"version": 1, "topic": "getNestedProperties", "args": [{"element": [0, 1]}, ["a", "b"]]}
//! ```
//!
//! The argument tuple of a topic maps positionally onto `args`; topics
//! without arguments carry an empty array.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CatalogError, PROTOCOL_VERSION};

fn default_version() -> u16 {
    PROTOCOL_VERSION
}

/// A topic name plus its positional arguments, as carried by the port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Catalog version of the sender.
    #[serde(default = "default_version")]
    pub version: u16,
    /// Topic name as declared in the catalog.
    pub topic: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl WireMessage {
    /// Create a message stamped with the current protocol version.
    pub fn new(topic: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            topic: topic.into(),
            args,
        }
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string(self).map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    /// Parse a JSON message.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    /// Parse a JSON message from raw bytes, which need not be valid UTF-8.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CatalogError> {
        serde_json::from_slice(raw).map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    /// Reject messages produced by a different catalog version.
    pub fn check_version(&self) -> Result<(), CatalogError> {
        if self.version != PROTOCOL_VERSION {
            return Err(CatalogError::VersionMismatch {
                received: self.version,
                supported: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }
}

/// Encode an argument tuple into positional JSON values.
pub fn encode_args<T: Serialize>(topic: &str, args: &T) -> Result<Vec<Value>, CatalogError> {
    match serde_json::to_value(args) {
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(Value::Array(values)) => Ok(values),
        Ok(other) => Ok(vec![other]),
        Err(e) => Err(CatalogError::ArgumentShape {
            topic: topic.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Decode positional JSON values into the argument tuple of a topic.
pub fn decode_args<T: DeserializeOwned>(
    topic: &str,
    arity: usize,
    args: Vec<Value>,
) -> Result<T, CatalogError> {
    if args.len() != arity {
        return Err(CatalogError::Arity {
            topic: topic.to_string(),
            expected: arity,
            actual: args.len(),
        });
    }

    // The unit tuple deserializes from null, not from an empty array.
    let value = if arity == 0 {
        Value::Null
    } else {
        Value::Array(args)
    };

    serde_json::from_value(value).map_err(|e| CatalogError::ArgumentShape {
        topic: topic.to_string(),
        reason: e.to_string(),
    })
}
