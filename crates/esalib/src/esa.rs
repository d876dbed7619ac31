//! The [`Esa`] facade.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;
use esalib_core::types::AnalyzerInfo;
use esalib_core::{SpectrumAnalyzer, linspace};
use esalib_transport::{OpenOptions, ResourceAddress};

use crate::config::EsaConfig;
use crate::registry;

/// Start frequency applied by [`Esa::init_device`].
pub const INIT_START_FREQUENCY_HZ: f64 = 10.0;

/// Trace exported by [`Esa::get_rawdata_from_spectrum`].
pub const RAWDATA_TRACE: u8 = 1;

/// A spectrum analyzer selected by name from an [`EsaConfig`].
///
/// The driver is chosen once at construction and never changes. Every
/// numeric value successfully read or written is remembered under its
/// attribute name and reported by [`get_status`](Self::get_status).
pub struct Esa {
    config: EsaConfig,
    driver: Box<dyn SpectrumAnalyzer>,
    last_measurement: Mutex<BTreeMap<String, f64>>,
}

impl Esa {
    /// Open `resource` (a VISA-style address such as
    /// `TCPIP0::192.168.1.20::5025::SOCKET`) and load the configured driver.
    ///
    /// The driver name is checked before the resource is opened.
    pub async fn open(resource: &str, config: EsaConfig) -> Result<Self> {
        let definition = registry::find_driver(&config.devicedriver)?;
        let transport = open_resource(resource, &config)
            .await
            .map_err(|e| init_error(&config, e))?;
        Self::build(config, definition, transport).await
    }

    /// Load the configured driver on top of an already open transport.
    pub async fn with_transport(config: EsaConfig, transport: Box<dyn Transport>) -> Result<Self> {
        let definition = registry::find_driver(&config.devicedriver)?;
        Self::build(config, definition, transport).await
    }

    /// Wrap a driver that was constructed elsewhere.
    pub fn from_driver(config: EsaConfig, driver: Box<dyn SpectrumAnalyzer>) -> Self {
        log_identity(&config, driver.info());
        Esa {
            config,
            driver,
            last_measurement: Mutex::new(BTreeMap::new()),
        }
    }

    async fn build(
        config: EsaConfig,
        definition: esalib_core::AnalyzerDefinition,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let driver = registry::build_driver(definition, transport, config.timeout())
            .await
            .map_err(|e| init_error(&config, e))?;
        Ok(Self::from_driver(config, driver))
    }

    pub fn config(&self) -> &EsaConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn info(&self) -> &AnalyzerInfo {
        self.driver.info()
    }

    /// The underlying driver, for operations the facade does not forward.
    pub fn driver(&self) -> &dyn SpectrumAnalyzer {
        self.driver.as_ref()
    }

    fn measurements(&self) -> MutexGuard<'_, BTreeMap<String, f64>> {
        self.last_measurement
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, name: &str, value: f64) {
        self.measurements().insert(name.to_string(), value);
    }

    /// Snapshot of the last value seen for every attribute.
    pub fn get_status(&self) -> BTreeMap<String, f64> {
        self.measurements().clone()
    }

    // ---------------------------------------------------------------
    // Device state
    // ---------------------------------------------------------------

    /// Restore the manufacturer defaults and wait until done.
    pub async fn reset(&self) -> Result<u32> {
        let code = self.driver.reset().await?;
        self.measurements().clear();
        Ok(code)
    }

    pub async fn wait_to_complete(&self) -> Result<u32> {
        self.driver.wait_to_complete().await
    }

    /// Put the analyzer into a known state: start frequency 10 Hz.
    pub async fn init_device(&self) -> Result<()> {
        debug!(label = %self.config.label, "init device");
        self.set_start_frequency(INIT_START_FREQUENCY_HZ).await
    }

    pub async fn close(&self) -> Result<()> {
        self.driver.close().await
    }

    // ---------------------------------------------------------------
    // Frequency and bandwidth
    // ---------------------------------------------------------------

    pub async fn get_start_frequency(&self) -> Result<f64> {
        let value = self.driver.get_start_frequency().await?;
        self.record("start_frequency", value);
        Ok(value)
    }

    pub async fn set_start_frequency(&self, freq_hz: f64) -> Result<()> {
        self.driver.set_start_frequency(freq_hz).await?;
        self.record("start_frequency", freq_hz);
        Ok(())
    }

    pub async fn get_stop_frequency(&self) -> Result<f64> {
        let value = self.driver.get_stop_frequency().await?;
        self.record("stop_frequency", value);
        Ok(value)
    }

    pub async fn set_stop_frequency(&self, freq_hz: f64) -> Result<()> {
        self.driver.set_stop_frequency(freq_hz).await?;
        self.record("stop_frequency", freq_hz);
        Ok(())
    }

    pub async fn get_center_frequency(&self) -> Result<f64> {
        let value = self.driver.get_center_frequency().await?;
        self.record("center_frequency", value);
        Ok(value)
    }

    pub async fn set_center_frequency(&self, freq_hz: f64) -> Result<()> {
        self.driver.set_center_frequency(freq_hz).await?;
        self.record("center_frequency", freq_hz);
        Ok(())
    }

    pub async fn set_span_frequency(&self, span_hz: f64) -> Result<()> {
        self.driver.set_span_frequency(span_hz).await?;
        self.record("span_frequency", span_hz);
        Ok(())
    }

    pub async fn get_video_bw(&self) -> Result<f64> {
        let value = self.driver.get_video_bw().await?;
        self.record("video_bw", value);
        Ok(value)
    }

    pub async fn set_video_bw(&self, bw_hz: f64) -> Result<()> {
        self.driver.set_video_bw(bw_hz).await?;
        self.record("video_bw", bw_hz);
        Ok(())
    }

    pub async fn get_resolution_bw(&self) -> Result<f64> {
        let value = self.driver.get_resolution_bw().await?;
        self.record("resolution_bw", value);
        Ok(value)
    }

    pub async fn set_resolution_bw(&self, bw_hz: f64) -> Result<()> {
        self.driver.set_resolution_bw(bw_hz).await?;
        self.record("resolution_bw", bw_hz);
        Ok(())
    }

    pub async fn set_resolution_bw_auto(&self, on: bool) -> Result<()> {
        self.driver.set_resolution_bw_auto(on).await
    }

    // ---------------------------------------------------------------
    // Sweep
    // ---------------------------------------------------------------

    pub async fn get_sweep_points(&self) -> Result<u32> {
        let value = self.driver.get_sweep_points().await?;
        self.record("sweep_points", f64::from(value));
        Ok(value)
    }

    /// Set the sweep point count and return the count sent. When the driver
    /// clamps the request, the clamped count is what gets recorded.
    pub async fn set_sweep_points(&self, points: u32) -> Result<u32> {
        let sent = self.driver.set_sweep_points(points).await?;
        self.record("sweep_points", f64::from(sent));
        Ok(sent)
    }

    pub async fn get_sweeptime(&self) -> Result<f64> {
        let value = self.driver.get_sweeptime().await?;
        self.record("sweep_time", value);
        Ok(value)
    }

    pub async fn set_sweep_single(&self, single: bool) -> Result<()> {
        self.driver.set_sweep_single(single).await
    }

    pub async fn get_trace(&self, trace: u8) -> Result<Vec<f64>> {
        self.driver.get_trace(trace).await
    }

    // ---------------------------------------------------------------
    // Markers
    // ---------------------------------------------------------------

    /// Frequency of `marker`. Single-marker analyzers ignore the index.
    pub async fn get_marker_frequency(&self, marker: u8) -> Result<f64> {
        let value = self.driver.get_marker_frequency(marker).await?;
        self.record("marker_frequency", value);
        Ok(value)
    }

    /// Amplitude of `marker`. Single-marker analyzers ignore the index.
    pub async fn get_marker_amplitude(&self, marker: u8) -> Result<f64> {
        let value = self.driver.get_marker_amplitude(marker).await?;
        self.record("marker_amplitude", value);
        Ok(value)
    }

    /// Move `marker` to the highest peak of its trace.
    pub async fn set_move_marker_peak(&self, marker: u8) -> Result<()> {
        self.driver.set_move_marker_peak(marker).await
    }

    pub async fn get_calculate_marker_x(&self, marker: u8) -> Result<f64> {
        self.driver.get_calculate_marker_x(marker).await
    }

    pub async fn set_calculate_marker_bandpower(&self, marker: u8, on: bool) -> Result<()> {
        self.driver.set_calculate_marker_bandpower(marker, on).await
    }

    pub async fn get_marker_band_left_freq(&self, marker: u8) -> Result<f64> {
        self.driver.get_marker_band_left_freq(marker).await
    }

    pub async fn set_marker_band_left_freq(&self, marker: u8, freq_hz: f64) -> Result<()> {
        self.driver.set_marker_band_left_freq(marker, freq_hz).await
    }

    pub async fn get_marker_band_right_freq(&self, marker: u8) -> Result<f64> {
        self.driver.get_marker_band_right_freq(marker).await
    }

    pub async fn set_marker_band_right_freq(&self, marker: u8, freq_hz: f64) -> Result<()> {
        self.driver.set_marker_band_right_freq(marker, freq_hz).await
    }

    // ---------------------------------------------------------------
    // Application and corrections
    // ---------------------------------------------------------------

    pub async fn get_instrument_select_option(&self) -> Result<String> {
        self.driver.get_instrument_select_option().await
    }

    pub async fn set_instrument_select(&self, application: &str) -> Result<()> {
        self.driver.set_instrument_select(application).await
    }

    pub async fn set_correction_noise_floor(&self, on: bool) -> Result<()> {
        self.driver.set_correction_noise_floor(on).await
    }

    // ---------------------------------------------------------------
    // By-name access
    // ---------------------------------------------------------------

    /// Read a numeric attribute by name, e.g. `"start_frequency"`.
    pub async fn get_property(&self, name: &str) -> Result<f64> {
        let value = self.driver.get_property(name).await?;
        self.record(name, value);
        Ok(value)
    }

    /// Write a numeric attribute by name and return the value sent.
    pub async fn set_property(&self, name: &str, value: f64) -> Result<f64> {
        let sent = self.driver.set_property(name, value).await?;
        self.record(name, sent);
        Ok(sent)
    }

    pub fn property_names(&self) -> Vec<&'static str> {
        self.driver.property_names()
    }

    // ---------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------

    /// Fetch trace 1 and write it to `dir/file` as a two-column CSV
    /// (`frequency_hz,amplitude`).
    ///
    /// Frequencies are spread evenly from the current start to the current
    /// stop frequency. `dir` is created if missing. Returns the written path.
    pub async fn get_rawdata_from_spectrum(
        &self,
        dir: impl AsRef<Path>,
        file: &str,
    ) -> Result<PathBuf> {
        let start = self.get_start_frequency().await?;
        let stop = self.get_stop_frequency().await?;
        let amplitudes = self.driver.get_trace(RAWDATA_TRACE).await?;
        let frequencies = linspace(start, stop, amplitudes.len());

        let mut csv = String::from("frequency_hz,amplitude\n");
        for (freq, amplitude) in frequencies.iter().zip(&amplitudes) {
            csv.push_str(&format!("{freq},{amplitude}\n"));
        }

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file);
        tokio::fs::write(&path, csv).await?;
        info!(
            label = %self.config.label,
            path = %path.display(),
            points = amplitudes.len(),
            "spectrum written"
        );
        Ok(path)
    }
}

async fn open_resource(resource: &str, config: &EsaConfig) -> Result<Box<dyn Transport>> {
    let address: ResourceAddress = resource.parse()?;
    let mut options = OpenOptions::default();
    if let Some(timeout) = config.timeout() {
        options.connect_timeout = timeout;
    }
    address.open(&options).await
}

fn init_error(config: &EsaConfig, source: Error) -> Error {
    Error::DriverInitialization {
        driver: config.devicedriver.clone(),
        source: Box::new(source),
    }
}

fn log_identity(config: &EsaConfig, info: &AnalyzerInfo) {
    info!(
        label = %config.label,
        driver = %info.driver_name,
        vendor = %info.identity.vendor,
        model = %info.identity.model,
        serial = %info.identity.serial,
        firmware = %info.identity.firmware,
        "device information"
    );
}
