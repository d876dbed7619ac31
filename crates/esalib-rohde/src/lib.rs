//! Rohde & Schwarz analyzer driver for esalib.
//!
//! This crate implements the SCPI dialect of the R&S FSUP signal source
//! analyzer (FSU-family command set). It provides:
//!
//! - **Commands** ([`commands`]) -- the dialect as `const` property
//!   descriptors plus the fixed program messages (peak search, sweep mode,
//!   trace readout).
//! - **Model definitions** ([`models`]) -- static data for the FSUP50.
//! - **Builder** ([`builder`]) -- fluent construction of a
//!   [`RohdeAnalyzer`] from a transport or resource address.
//! - **Analyzer** ([`analyzer`]) -- the
//!   [`SpectrumAnalyzer`](esalib_core::SpectrumAnalyzer) implementation.
//!
//! # FSU-family dialect notes
//!
//! - A single marker is addressed implicitly (`CALC:MARK:...`); marker
//!   arguments on the trait are accepted and ignored.
//! - Bandwidth settings carry an explicit `Hz` unit suffix.
//! - Trace data is read with `TRAC? TRACE<n>` in ASCII, one value per
//!   sweep point.
//!
//! # Example
//!
//! ```
//! use esalib_rohde::commands::START_FREQUENCY;
//!
//! assert_eq!(START_FREQUENCY.set_command_for(10.0).unwrap(), "FREQ:STAR 10.000000");
//! ```

pub mod analyzer;
pub mod builder;
pub mod commands;
pub mod models;

pub use analyzer::RohdeAnalyzer;
pub use builder::RohdeBuilder;
