//! KeysightAnalyzer -- [`SpectrumAnalyzer`] implementation for X-Series
//! analyzers.

use async_trait::async_trait;
use tracing::debug;

use esalib_core::error::Result;
use esalib_core::types::{AnalyzerDefinition, AnalyzerInfo};
use esalib_core::SpectrumAnalyzer;
use esalib_scpi::property;
use esalib_scpi::{ScpiInstrument, ScpiValue};

use crate::commands::{self, BandEdge};

/// A connected Keysight X-Series analyzer.
///
/// Created via [`KeysightBuilder`](crate::builder::KeysightBuilder).
pub struct KeysightAnalyzer {
    instrument: ScpiInstrument,
    definition: AnalyzerDefinition,
    info: AnalyzerInfo,
}

impl KeysightAnalyzer {
    pub(crate) fn new(instrument: ScpiInstrument, definition: AnalyzerDefinition) -> Self {
        let info = AnalyzerInfo {
            manufacturer: definition.manufacturer,
            driver_name: definition.driver_name.to_string(),
            identity: instrument.identity().clone(),
        };
        debug!(identity = %info.identity, driver = definition.driver_name, "Keysight analyzer ready");
        KeysightAnalyzer {
            instrument,
            definition,
            info,
        }
    }

    pub fn definition(&self) -> &AnalyzerDefinition {
        &self.definition
    }

    pub fn instrument(&self) -> &ScpiInstrument {
        &self.instrument
    }

    async fn query_f64(&self, command: &str) -> Result<f64> {
        let reply = self.instrument.ask(command).await?;
        f64::from_scpi(&reply)
    }

    /// Whether noise floor extension is currently on.
    pub async fn get_correction_noise_floor(&self) -> Result<bool> {
        commands::NOISE_FLOOR_EXTENSION.get(&self.instrument).await
    }
}

#[async_trait]
impl SpectrumAnalyzer for KeysightAnalyzer {
    fn info(&self) -> &AnalyzerInfo {
        &self.info
    }

    async fn reset(&self) -> Result<u32> {
        self.instrument.reset().await
    }

    async fn wait_to_complete(&self) -> Result<u32> {
        self.instrument.wait_to_complete().await
    }

    async fn get_start_frequency(&self) -> Result<f64> {
        commands::START_FREQUENCY.get(&self.instrument).await
    }

    async fn set_start_frequency(&self, freq_hz: f64) -> Result<()> {
        commands::START_FREQUENCY.set(&self.instrument, freq_hz).await?;
        Ok(())
    }

    async fn get_stop_frequency(&self) -> Result<f64> {
        commands::STOP_FREQUENCY.get(&self.instrument).await
    }

    async fn set_stop_frequency(&self, freq_hz: f64) -> Result<()> {
        commands::STOP_FREQUENCY.set(&self.instrument, freq_hz).await?;
        Ok(())
    }

    async fn get_video_bw(&self) -> Result<f64> {
        commands::VIDEO_BW.get(&self.instrument).await
    }

    async fn set_video_bw(&self, bw_hz: f64) -> Result<()> {
        commands::VIDEO_BW.set(&self.instrument, bw_hz).await?;
        Ok(())
    }

    async fn get_resolution_bw(&self) -> Result<f64> {
        commands::RESOLUTION_BW.get(&self.instrument).await
    }

    async fn set_resolution_bw(&self, bw_hz: f64) -> Result<()> {
        commands::RESOLUTION_BW.set(&self.instrument, bw_hz).await?;
        Ok(())
    }

    async fn set_center_frequency(&self, freq_hz: f64) -> Result<()> {
        commands::CENTER_FREQUENCY.set(&self.instrument, freq_hz).await?;
        Ok(())
    }

    async fn set_span_frequency(&self, span_hz: f64) -> Result<()> {
        commands::SPAN_FREQUENCY.set(&self.instrument, span_hz).await?;
        Ok(())
    }

    async fn get_sweep_points(&self) -> Result<u32> {
        commands::SWEEP_POINTS.get(&self.instrument).await
    }

    async fn set_sweep_points(&self, points: u32) -> Result<u32> {
        commands::SWEEP_POINTS.set(&self.instrument, points).await
    }

    async fn get_marker_frequency(&self, marker: u8) -> Result<f64> {
        self.query_f64(&commands::cmd_marker_x(marker)?).await
    }

    async fn get_marker_amplitude(&self, marker: u8) -> Result<f64> {
        self.query_f64(&commands::cmd_marker_y(marker)?).await
    }

    async fn set_move_marker_peak(&self, marker: u8) -> Result<()> {
        self.instrument
            .write(&commands::cmd_marker_peak(marker)?)
            .await
    }

    async fn get_sweeptime(&self) -> Result<f64> {
        commands::SWEEP_TIME.get(&self.instrument).await
    }

    async fn set_sweep_single(&self, single: bool) -> Result<()> {
        self.instrument
            .write(if single {
                commands::SWEEP_SINGLE
            } else {
                commands::SWEEP_CONTINUOUS
            })
            .await
    }

    async fn get_trace(&self, trace: u8) -> Result<Vec<f64>> {
        let query = commands::cmd_read_trace(trace)?;
        let reply = self.instrument.ask(&query).await?;
        commands::parse_trace(&reply)
    }

    async fn get_property(&self, name: &str) -> Result<f64> {
        property::lookup(commands::NUMERIC_PROPERTIES, name)?
            .get(&self.instrument)
            .await
    }

    async fn set_property(&self, name: &str, value: f64) -> Result<f64> {
        property::lookup(commands::NUMERIC_PROPERTIES, name)?
            .set(&self.instrument, value)
            .await
    }

    fn property_names(&self) -> Vec<&'static str> {
        commands::NUMERIC_PROPERTIES.iter().map(|p| p.name()).collect()
    }

    async fn close(&self) -> Result<()> {
        self.instrument.close().await
    }

    async fn get_center_frequency(&self) -> Result<f64> {
        commands::CENTER_FREQUENCY.get(&self.instrument).await
    }

    async fn set_resolution_bw_auto(&self, on: bool) -> Result<()> {
        commands::RESOLUTION_BW_AUTO.set(&self.instrument, on).await?;
        Ok(())
    }

    async fn get_instrument_select_option(&self) -> Result<String> {
        let reply = self.instrument.ask(commands::INSTRUMENT_CATALOG).await?;
        Ok(commands::parse_catalog(&reply))
    }

    async fn set_instrument_select(&self, application: &str) -> Result<()> {
        self.instrument
            .write(&commands::cmd_instrument_select(application)?)
            .await?;
        // Switching applications takes seconds; block until it has finished.
        self.instrument.wait_to_complete().await?;
        Ok(())
    }

    async fn set_correction_noise_floor(&self, on: bool) -> Result<()> {
        commands::NOISE_FLOOR_EXTENSION.set(&self.instrument, on).await?;
        Ok(())
    }

    async fn set_calculate_marker_bandpower(&self, marker: u8, on: bool) -> Result<()> {
        self.instrument
            .write(&commands::cmd_marker_bandpower(marker, on)?)
            .await
    }

    async fn get_marker_band_left_freq(&self, marker: u8) -> Result<f64> {
        self.query_f64(&commands::cmd_marker_band_edge_query(marker, BandEdge::Left)?)
            .await
    }

    async fn set_marker_band_left_freq(&self, marker: u8, freq_hz: f64) -> Result<()> {
        let command = commands::cmd_marker_band_edge_set(marker, BandEdge::Left, freq_hz)?;
        self.instrument.write(&command).await
    }

    async fn get_marker_band_right_freq(&self, marker: u8) -> Result<f64> {
        self.query_f64(&commands::cmd_marker_band_edge_query(marker, BandEdge::Right)?)
            .await
    }

    async fn set_marker_band_right_freq(&self, marker: u8, freq_hz: f64) -> Result<()> {
        let command = commands::cmd_marker_band_edge_set(marker, BandEdge::Right, freq_hz)?;
        self.instrument.write(&command).await
    }

    async fn get_calculate_marker_x(&self, marker: u8) -> Result<f64> {
        self.query_f64(&commands::cmd_marker_x(marker)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::KeysightBuilder;
    use crate::models::n9030a;
    use esalib_core::Error;
    use esalib_test_harness::{MockTransport, SimulatedAnalyzer};
    use std::time::Duration;

    async fn with_mock(mock: &mut MockTransport) -> KeysightAnalyzer {
        mock.expect(b"*IDN?\n", b"Keysight Technologies,N9030A,MY51234567,A.33.03\n");
        KeysightBuilder::new(n9030a())
            .command_timeout(Duration::from_millis(100))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap()
    }

    async fn simulated() -> (KeysightAnalyzer, SimulatedAnalyzer) {
        let sim = SimulatedAnalyzer::n9030a();
        let analyzer = KeysightBuilder::new(n9030a())
            .build_with_transport(Box::new(sim.clone()))
            .await
            .unwrap();
        (analyzer, sim)
    }

    #[tokio::test]
    async fn reset_sends_rst_then_opc() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"*RST\n");
        mock.expect(b"*OPC?\n", b"1\n");

        assert_eq!(analyzer.reset().await.unwrap(), 0);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn marker_index_forwarded() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"CALC:MARK3:MAX\n");
        mock.expect(b"CALC:MARK3:Y?\n", b"-12.75\n");
        mock.expect(b"CALC:MARK3:X?\n", b"2.4E+009\n");

        analyzer.set_move_marker_peak(3).await.unwrap();
        assert_eq!(analyzer.get_marker_amplitude(3).await.unwrap(), -12.75);
        assert_eq!(analyzer.get_calculate_marker_x(3).await.unwrap(), 2.4e9);
    }

    #[tokio::test]
    async fn invalid_marker_sends_nothing() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;

        assert!(matches!(
            analyzer.get_marker_frequency(0).await,
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn sweep_points_clamped() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"SENS:SWE:POIN 40001\n");

        assert_eq!(analyzer.set_sweep_points(100_000).await.unwrap(), 40001);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn band_power_sequence() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"CALC:MARK1:FUNC BPOW\n");
        mock.expect_write(b"CALC:MARK1:FUNC:BAND:LEFT 1000000.000000\n");
        mock.expect_write(b"CALC:MARK1:FUNC:BAND:RIGHT 2000000.000000\n");
        mock.expect(b"CALC:MARK1:FUNC:BAND:LEFT?\n", b"1.0E+006\n");

        analyzer.set_calculate_marker_bandpower(1, true).await.unwrap();
        analyzer.set_marker_band_left_freq(1, 1e6).await.unwrap();
        analyzer.set_marker_band_right_freq(1, 2e6).await.unwrap();
        assert_eq!(analyzer.get_marker_band_left_freq(1).await.unwrap(), 1e6);
    }

    #[tokio::test]
    async fn instrument_select_waits() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"INST:SEL SA\n");
        mock.expect(b"*OPC?\n", b"1\n");

        analyzer.set_instrument_select("SA").await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn catalog_and_noise_floor_against_simulator() {
        let (analyzer, sim) = simulated().await;

        assert!(analyzer
            .get_instrument_select_option()
            .await
            .unwrap()
            .starts_with("SA"));

        analyzer.set_correction_noise_floor(true).await.unwrap();
        assert!(analyzer.get_correction_noise_floor().await.unwrap());
        assert_eq!(sim.setting("SENS:CORR:NOIS:FLO").as_deref(), Some("ON"));
    }

    #[tokio::test]
    async fn round_trip_against_simulator() {
        let (analyzer, _sim) = simulated().await;

        analyzer.set_center_frequency(1e9).await.unwrap();
        analyzer.set_resolution_bw(3e3).await.unwrap();
        analyzer.set_sweep_points(1001).await.unwrap();

        assert_eq!(analyzer.get_center_frequency().await.unwrap(), 1e9);
        assert_eq!(analyzer.get_resolution_bw().await.unwrap(), 3e3);
        assert_eq!(analyzer.get_property("sweep_points").await.unwrap(), 1001.0);
        assert_eq!(analyzer.get_trace(2).await.unwrap().len(), 1001);
    }
}
