//! # Cross-Query Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/fixtures.rs     # In-process TCP endorsers (honest and scripted)
//! ├── src/integration/    # End-to-end query flows
//! └── benches/            # Verification and encoding benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cq-tests
//!
//! # Benchmarks
//! cargo bench -p cq-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
