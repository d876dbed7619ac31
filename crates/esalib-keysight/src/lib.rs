//! Keysight X-Series analyzer driver for esalib.
//!
//! This crate implements the SCPI dialect of the Keysight (formerly
//! Agilent) X-Series signal analyzers, modelled on the N9030A PXA:
//!
//! - **Commands** ([`commands`]) -- `SENS:` subsystem property descriptors
//!   and marker-indexed command builders.
//! - **Model definitions** ([`models`]) -- static data for the N9030A.
//! - **Builder** ([`builder`]) -- fluent construction of a
//!   [`KeysightAnalyzer`].
//! - **Analyzer** ([`analyzer`]) -- the
//!   [`SpectrumAnalyzer`](esalib_core::SpectrumAnalyzer) implementation,
//!   including the X-Series extras (application select, noise floor
//!   extension, band power markers).
//!
//! Unlike the FSU family, every marker command carries an explicit marker
//! number (`CALC:MARK3:Y?`), so the trait's marker argument is honored.

pub mod analyzer;
pub mod builder;
pub mod commands;
pub mod models;

pub use analyzer::KeysightAnalyzer;
pub use builder::KeysightBuilder;
