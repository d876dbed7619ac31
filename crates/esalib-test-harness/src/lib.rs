//! esalib-test-harness: Test utilities for esalib.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! SCPI command sequences without real instruments, and
//! [`SimulatedAnalyzer`], a stateful transport that answers queries with
//! the values previously written, for end-to-end tests of drivers and the
//! facade.

pub mod mock_transport;
pub mod simulated;

pub use mock_transport::MockTransport;
pub use simulated::SimulatedAnalyzer;
