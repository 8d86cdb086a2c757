//! # Port Bridge
//!
//! Binds the abstract message bus to a concrete, fallible duplex port and to
//! a cooperative batch boundary.
//!
//! ## Pieces
//!
//! - [`Port`], [`PortSink`], [`Transport`]: the transport capability.
//! - [`port_pair`], [`port_from_stream`], [`TcpTransport`]: implementations.
//! - [`BatchBoundary`]: scope that turns N inbound messages into one
//!   observer notification.
//! - [`PortMessageBus`]: the adapter. Outbound `emit` goes to the port,
//!   inbound messages are re-emitted locally, and disconnect is a one-way
//!   `Connected -> Disconnected` transition.
//!
//! ## Reconnects
//!
//! An adapter never reconnects. The owner builds a new adapter for every
//! fresh port.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapter;
pub mod boundary;
pub mod errors;
pub mod memory;
pub mod port;
pub mod state;
pub mod stream;
pub mod tcp;

#[cfg(test)]
mod test_catalog;

pub use adapter::{AdapterStats, PortMessageBus};
pub use boundary::{BatchBoundary, ChangeNotifier, CountingBoundary, Immediate};
pub use errors::TransportError;
pub use memory::{port_pair, MemoryTransport};
pub use port::{Port, PortSink, Transport};
pub use state::ConnectionState;
pub use stream::{port_from_stream, MAX_LINE_BYTES};
pub use tcp::{port_from_tcp, TcpTransport};
