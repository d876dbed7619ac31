//! The `SpectrumAnalyzer` trait -- unified interface for all analyzer drivers.
//!
//! This trait is the primary API surface of esalib. Test benches and
//! measurement scripts program against `dyn SpectrumAnalyzer` without
//! needing to know which SCPI dialect is in use.
//!
//! Marker-indexed operations always take a marker number. Drivers for
//! instruments whose dialect addresses a single implicit marker accept
//! the argument and ignore it, so callers never need to know which model
//! they are talking to.
//!
//! Operations that only some models offer have default implementations
//! returning [`Error::Unsupported`](crate::error::Error::Unsupported).

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::AnalyzerInfo;

/// Unified asynchronous interface for controlling a spectrum analyzer.
///
/// Every method that talks to the instrument is a single request/response
/// exchange awaited to completion. Frequencies and bandwidths are in hertz,
/// amplitudes in the unit the instrument is configured for (usually dBm),
/// times in seconds.
#[async_trait]
pub trait SpectrumAnalyzer: Send + Sync {
    /// Return information about the connected analyzer.
    fn info(&self) -> &AnalyzerInfo;

    /// Reset the instrument to manufacturer defaults (`*RST`) and wait for
    /// completion.
    ///
    /// Returns the completion code: `0` when the instrument reported all
    /// operations complete, non-zero otherwise.
    async fn reset(&self) -> Result<u32>;

    /// Block until all pending operations have finished (`*OPC?`).
    ///
    /// Returns the completion code, `0` meaning no failure.
    async fn wait_to_complete(&self) -> Result<u32>;

    /// Get the start frequency of the sweep.
    async fn get_start_frequency(&self) -> Result<f64>;

    /// Set the start frequency of the sweep.
    async fn set_start_frequency(&self, freq_hz: f64) -> Result<()>;

    /// Get the stop frequency of the sweep.
    async fn get_stop_frequency(&self) -> Result<f64>;

    /// Set the stop frequency of the sweep.
    async fn set_stop_frequency(&self, freq_hz: f64) -> Result<()>;

    /// Get the video bandwidth.
    async fn get_video_bw(&self) -> Result<f64>;

    /// Set the video bandwidth.
    async fn set_video_bw(&self, bw_hz: f64) -> Result<()>;

    /// Get the resolution bandwidth.
    async fn get_resolution_bw(&self) -> Result<f64>;

    /// Set the resolution bandwidth.
    async fn set_resolution_bw(&self, bw_hz: f64) -> Result<()>;

    /// Set the center frequency.
    async fn set_center_frequency(&self, freq_hz: f64) -> Result<()>;

    /// Set the frequency span.
    async fn set_span_frequency(&self, span_hz: f64) -> Result<()>;

    /// Get the number of points per sweep.
    async fn get_sweep_points(&self) -> Result<u32>;

    /// Set the number of points per sweep. Returns the count actually sent,
    /// which a clamping driver may have adjusted.
    async fn set_sweep_points(&self, points: u32) -> Result<u32>;

    /// Read the frequency of a marker.
    async fn get_marker_frequency(&self, marker: u8) -> Result<f64>;

    /// Read the amplitude of a marker.
    async fn get_marker_amplitude(&self, marker: u8) -> Result<f64>;

    /// Move a marker to the highest peak of the trace.
    async fn set_move_marker_peak(&self, marker: u8) -> Result<()>;

    /// Read the sweep time.
    async fn get_sweeptime(&self) -> Result<f64>;

    /// Select single sweep (`true`) or continuous sweep (`false`).
    async fn set_sweep_single(&self, single: bool) -> Result<()>;

    /// Read the amplitude values of a trace, one per sweep point.
    async fn get_trace(&self, trace: u8) -> Result<Vec<f64>>;

    /// Read a numeric property by attribute name (e.g. `"start_frequency"`).
    async fn get_property(&self, name: &str) -> Result<f64>;

    /// Write a numeric property by attribute name and return the value sent.
    async fn set_property(&self, name: &str, value: f64) -> Result<f64>;

    /// Names of the numeric properties accepted by
    /// [`get_property`](Self::get_property) and
    /// [`set_property`](Self::set_property).
    fn property_names(&self) -> Vec<&'static str>;

    /// Close the connection to the instrument.
    async fn close(&self) -> Result<()>;

    /// Get the center frequency.
    async fn get_center_frequency(&self) -> Result<f64> {
        Err(Error::Unsupported("center frequency readback".into()))
    }

    /// Enable or disable automatic coupling of the resolution bandwidth
    /// to the span.
    async fn set_resolution_bw_auto(&self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("resolution bandwidth auto coupling".into()))
    }

    /// Query the catalog of measurement applications installed on the
    /// instrument.
    async fn get_instrument_select_option(&self) -> Result<String> {
        Err(Error::Unsupported("instrument application catalog".into()))
    }

    /// Select the active measurement application (e.g. `"SA"`).
    async fn set_instrument_select(&self, _application: &str) -> Result<()> {
        Err(Error::Unsupported("instrument application select".into()))
    }

    /// Enable or disable noise floor extension.
    async fn set_correction_noise_floor(&self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("noise floor extension".into()))
    }

    /// Switch the band power function of a marker on or off.
    async fn set_calculate_marker_bandpower(&self, _marker: u8, _on: bool) -> Result<()> {
        Err(Error::Unsupported("marker band power".into()))
    }

    /// Get the left edge of a marker's band function.
    async fn get_marker_band_left_freq(&self, _marker: u8) -> Result<f64> {
        Err(Error::Unsupported("marker band edges".into()))
    }

    /// Set the left edge of a marker's band function.
    async fn set_marker_band_left_freq(&self, _marker: u8, _freq_hz: f64) -> Result<()> {
        Err(Error::Unsupported("marker band edges".into()))
    }

    /// Get the right edge of a marker's band function.
    async fn get_marker_band_right_freq(&self, _marker: u8) -> Result<f64> {
        Err(Error::Unsupported("marker band edges".into()))
    }

    /// Set the right edge of a marker's band function.
    async fn set_marker_band_right_freq(&self, _marker: u8, _freq_hz: f64) -> Result<()> {
        Err(Error::Unsupported("marker band edges".into()))
    }

    /// Read the X value of a marker (frequency, or time in zero span).
    async fn get_calculate_marker_x(&self, _marker: u8) -> Result<f64> {
        Err(Error::Unsupported("marker X readout".into()))
    }
}
