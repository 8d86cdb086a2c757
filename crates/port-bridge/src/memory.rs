//! # In-Memory Ports
//!
//! Two ports wired back to back inside one process. Used by tests and by
//! embedders that run both ends in the same runtime.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::WireMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::TransportError;
use crate::port::{Port, PortSink, Transport};

/// Sink that feeds the peer's inbound receiver.
struct MemorySink {
    name: String,
    peer: Mutex<Option<mpsc::UnboundedSender<WireMessage>>>,
}

impl PortSink for MemorySink {
    fn post(&self, message: WireMessage) -> Result<(), TransportError> {
        let peer = self.peer.lock();
        let sender = peer.as_ref().ok_or(TransportError::Disconnected)?;
        sender
            .send(message)
            .map_err(|_| TransportError::Disconnected)
    }

    fn close(&self) {
        if self.peer.lock().take().is_some() {
            debug!(port = %self.name, "Memory port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.peer
            .lock()
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }
}

/// Create two connected ports named `name`.
///
/// Whatever one side posts arrives on the other side's inbound receiver.
/// Closing or dropping one side's sink ends the other side's inbound stream.
pub fn port_pair(name: &str) -> (Port, Port) {
    let (to_a, a_inbound) = mpsc::unbounded_channel();
    let (to_b, b_inbound) = mpsc::unbounded_channel();

    let a_sink = Arc::new(MemorySink {
        name: name.to_string(),
        peer: Mutex::new(Some(to_b)),
    });
    let b_sink = Arc::new(MemorySink {
        name: name.to_string(),
        peer: Mutex::new(Some(to_a)),
    });

    (
        Port::new(name, a_sink, a_inbound),
        Port::new(name, b_sink, b_inbound),
    )
}

/// [`Transport`] that hands the far end of every new pair to an acceptor.
pub struct MemoryTransport {
    accepted: mpsc::UnboundedSender<Port>,
}

impl MemoryTransport {
    /// Create a transport and the receiver of the ports it opens remotely.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Port>) {
        let (accepted, acceptor) = mpsc::unbounded_channel();
        (Self { accepted }, acceptor)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, identity: &str) -> Result<Port, TransportError> {
        let (local, remote) = port_pair(identity);
        self.accepted
            .send(remote)
            .map_err(|_| TransportError::Disconnected)?;
        Ok(local)
    }
}
