//! TCP transport: dials an agent and speaks newline-delimited JSON.

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::info;

use crate::errors::TransportError;
use crate::port::{Port, Transport};
use crate::stream::port_from_stream;

/// Dials `address` on every [`Transport::connect`].
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Wrap an accepted or dialed socket as a port.
pub fn port_from_tcp(name: &str, stream: TcpStream) -> Port {
    if let Err(err) = stream.set_nodelay(true) {
        tracing::debug!(port = %name, error = %err, "Could not disable Nagle");
    }
    let (reader, writer) = stream.into_split();
    port_from_stream(name, reader, writer)
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, identity: &str) -> Result<Port, TransportError> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|source| TransportError::Connect {
                address: self.address.clone(),
                source,
            })?;
        info!(port = %identity, address = %self.address, "Connected to agent");
        Ok(port_from_tcp(identity, stream))
    }
}
