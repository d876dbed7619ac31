//! esalib-core: Core traits, types, and error definitions for esalib.
//!
//! This crate defines the model-agnostic abstractions that all esalib
//! analyzer drivers implement. Test benches and measurement scripts depend
//! on these types without pulling in any specific instrument dialect.
//!
//! # Key types
//!
//! - [`SpectrumAnalyzer`] -- the unified trait for controlling any analyzer
//! - [`Transport`] -- byte-level communication channel
//! - [`Identity`] -- the parsed `*IDN?` reply of a connected instrument
//! - [`Error`] / [`Result`] -- error handling

pub mod analyzer;
pub mod error;
pub mod helpers;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use esalib_core::*`.
pub use analyzer::SpectrumAnalyzer;
pub use error::{Error, Result};
pub use helpers::{format_freq_hz, linspace};
pub use transport::Transport;
pub use types::*;
