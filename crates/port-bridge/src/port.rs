//! # Transport Capability
//!
//! The host-provided duplex channel, reduced to what the adapter needs: a
//! sink for outbound messages, one inbound receiver, and disconnect
//! signalled by the end of that receiver.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::WireMessage;
use tokio::sync::mpsc;

use crate::errors::TransportError;

/// Outbound half of a port.
pub trait PortSink: Send + Sync {
    /// Send one message. Must not block, and must return
    /// [`TransportError::Disconnected`] rather than panic once the port is
    /// gone.
    fn post(&self, message: WireMessage) -> Result<(), TransportError>;

    /// Close the outbound half. Idempotent. The peer's inbound stream ends.
    fn close(&self);

    /// False once the outbound half is closed or the peer went away.
    fn is_open(&self) -> bool;
}

/// An established port.
pub struct Port {
    /// Identity the port was opened with.
    pub name: String,
    pub sink: Arc<dyn PortSink>,
    /// Inbound messages in transport order. Ends on disconnect.
    pub inbound: mpsc::UnboundedReceiver<WireMessage>,
}

impl Port {
    pub fn new(
        name: impl Into<String>,
        sink: Arc<dyn PortSink>,
        inbound: mpsc::UnboundedReceiver<WireMessage>,
    ) -> Self {
        Self {
            name: name.into(),
            sink,
            inbound,
        }
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("open", &self.sink.is_open())
            .finish_non_exhaustive()
    }
}

/// Opens ports by identity.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, identity: &str) -> Result<Port, TransportError>;
}
