//! # Shared Bus - Messaging Core for Inspector Links
//!
//! Typed publish/subscribe over a closed event catalog, plus a
//! priority-aware decorator that reorders traffic by class before handing
//! it to the bus it wraps.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────┐
//! │    PriorityAwareBus     │  per-class FIFOs, strict priority,
//! │  (decorates any bus)    │  starvation guard, drain budget
//! └───────────┬─────────────┘
//!             │ emit (reordered)
//!             ▼
//! ┌─────────────────────────┐
//! │  LocalMessageBus / any  │  synchronous dispatch in
//! │  MessageBus impl        │  registration order
//! └─────────────────────────┘
//! ```
//!
//! ## Dispatch Rules
//!
//! - Handlers for one topic run in registration order.
//! - A failing or panicking handler never stops delivery to the others.
//! - The handler set is snapshotted when dispatch starts; handlers removed
//!   mid-dispatch are skipped, handlers added mid-dispatch wait for the
//!   next emit.
//! - No bus lock is held while a handler runs, so handlers may re-enter.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod errors;
pub mod handler;
pub mod local;
pub mod priority;
pub mod stream;
pub mod subscription;

#[cfg(test)]
mod test_catalog;

// Re-export main types
pub use bus::MessageBus;
pub use errors::{BusError, HandlerError};
pub use handler::{BoxError, Handler};
pub use local::{BusStats, DispatchReport, LocalMessageBus};
pub use priority::{
    DrainBudget, DrainMode, DrainOutcome, PriorityAwareBus, SchedulerConfig, SchedulerStats,
    DEFAULT_STARVATION_BOUND,
};
pub use stream::EventStream;
pub use subscription::Subscription;
