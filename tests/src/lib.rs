//! # Inspector Link Test Suite
//!
//! Cross-crate tests. Unit tests live next to the code in each crate; this
//! crate wires the real pieces together over in-memory and TCP ports.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── priority_link.rs   # scheduler in front of a port adapter
//!     ├── batching.rs        # one boundary scope per inbound burst
//!     ├── disconnect.rs      # disconnect detection and teardown
//!     └── session_flow.rs    # panel sessions against a scripted agent
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p link-tests
//!
//! # Benchmarks
//! cargo bench -p link-tests
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
