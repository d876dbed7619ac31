//! # esalib -- Electrical Spectrum Analyzer control
//!
//! `esalib` is an asynchronous Rust library for driving bench spectrum
//! analyzers over SCPI. It hides the dialect differences between
//! manufacturers behind one facade, so a test bench script can set a span,
//! place a marker and read a trace without knowing which analyzer is
//! connected.
//!
//! ## Quick Start
//!
//! ```no_run
//! use esalib::{Esa, EsaConfig};
//!
//! #[tokio::main]
//! async fn main() -> esalib::Result<()> {
//!     let config = EsaConfig::new("FSUP50", "TX_ESA");
//!     let esa = Esa::open("TCPIP0::192.168.1.20::5025::SOCKET", config).await?;
//!
//!     esa.reset().await?;
//!     esa.init_device().await?;
//!     esa.set_center_frequency(1e9).await?;
//!     esa.set_span_frequency(10e6).await?;
//!     esa.set_move_marker_peak(1).await?;
//!     println!("peak: {} dBm", esa.get_marker_amplitude(1).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                | Purpose                                              |
//! |----------------------|------------------------------------------------------|
//! | `esalib-core`        | [`SpectrumAnalyzer`] and [`Transport`] traits, types, errors |
//! | `esalib-scpi`        | Line framing, property descriptors, validators, `*IDN?`/`*OPC?` |
//! | `esalib-transport`   | Raw SCPI socket and serial transports, resource addresses |
//! | `esalib-rohde`       | Rohde & Schwarz FSUP driver                           |
//! | `esalib-keysight`    | Keysight X-Series driver                              |
//! | **`esalib`**         | This facade crate -- [`Esa`], [`EsaConfig`], driver registry |
//!
//! ## Feature Flags
//!
//! | Feature    | Enables                          | Default |
//! |------------|----------------------------------|---------|
//! | `rohde`    | [`rohde`] module, `FSUP50` driver | yes    |
//! | `keysight` | [`keysight`] module, `N9030A` driver | yes |
//! | `full`     | All backends                     | no      |

pub mod config;
pub mod esa;
pub mod registry;

pub use esalib_core::*;

pub use config::EsaConfig;
pub use esa::Esa;
pub use registry::{find_driver, supported_drivers};

/// SCPI building blocks, for writing drivers outside this workspace.
pub mod scpi {
    pub use esalib_scpi::*;
}

/// Concrete transports and resource address parsing.
pub mod transport {
    pub use esalib_transport::*;
}

/// Rohde & Schwarz FSU-family backend.
///
/// Provides [`RohdeAnalyzer`](rohde::RohdeAnalyzer) and
/// [`RohdeBuilder`](rohde::RohdeBuilder). The FSUP dialect has a single
/// marker, so marker indices are accepted and ignored.
#[cfg(feature = "rohde")]
pub mod rohde {
    pub use esalib_rohde::*;
}

/// Keysight X-Series backend.
///
/// Provides [`KeysightAnalyzer`](keysight::KeysightAnalyzer) and
/// [`KeysightBuilder`](keysight::KeysightBuilder), with indexed markers,
/// band power and measurement application selection.
#[cfg(feature = "keysight")]
pub mod keysight {
    pub use esalib_keysight::*;
}
