//! # Panel Runtime
//!
//! The panel side of the inspector link. The binary in `main.rs` wires these
//! pieces to a TCP listener; the library is exposed for integration tests.
//!
//! - `config` - environment-driven settings
//! - `session` - one agent connection: scheduler, adapter and target status
//! - `supervisor` - accepts connections and replaces stale sessions
//! - `metrics` - copies session counters into the Prometheus registry

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod metrics;
pub mod session;
pub mod status;
pub mod supervisor;

pub use config::{ConfigError, PanelConfig, SchedulerSettings};
pub use metrics::SessionMetrics;
pub use session::{InspectorSession, PanelAdapter, PanelBus};
pub use status::TargetStatus;
pub use supervisor::Supervisor;
