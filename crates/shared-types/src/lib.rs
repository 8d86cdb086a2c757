//! # Shared Types Crate
//!
//! The catalog contract both ends of an inspector port agree on.
//!
//! ## Design Principles
//!
//! - **Closed catalog**: topics are a compile-time enumeration. A name that is
//!   not in the catalog is rejected, never guessed.
//! - **Fixed argument shapes**: every topic carries one tuple shape; both ends
//!   encode it positionally as a JSON array.
//! - **Static priority table**: every topic maps to exactly one
//!   [`PriorityClass`], with [`PriorityClass::DEFAULT`] for unmapped topics.
//!
//! Catalogs are declared with [`event_catalog!`], which generates the topic
//! enum, the event enum and both trait implementations.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod catalog;
pub mod errors;
pub mod priority;
pub mod wire;

pub use catalog::{Events, Topic};
pub use errors::CatalogError;
pub use priority::PriorityClass;
pub use wire::WireMessage;

/// Version stamped on every wire message. Both ends must agree.
pub const PROTOCOL_VERSION: u16 = 1;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
