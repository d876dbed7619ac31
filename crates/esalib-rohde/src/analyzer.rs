//! RohdeAnalyzer -- [`SpectrumAnalyzer`] implementation for the FSU family.

use async_trait::async_trait;
use tracing::{debug, trace};

use esalib_core::error::Result;
use esalib_core::types::{AnalyzerDefinition, AnalyzerInfo};
use esalib_core::SpectrumAnalyzer;
use esalib_scpi::property;
use esalib_scpi::ScpiInstrument;

use crate::commands;

/// A connected Rohde & Schwarz FSU-family analyzer.
///
/// Created via [`RohdeBuilder`](crate::builder::RohdeBuilder).
pub struct RohdeAnalyzer {
    instrument: ScpiInstrument,
    definition: AnalyzerDefinition,
    info: AnalyzerInfo,
}

impl RohdeAnalyzer {
    pub(crate) fn new(instrument: ScpiInstrument, definition: AnalyzerDefinition) -> Self {
        let info = AnalyzerInfo {
            manufacturer: definition.manufacturer,
            driver_name: definition.driver_name.to_string(),
            identity: instrument.identity().clone(),
        };
        debug!(identity = %info.identity, driver = definition.driver_name, "R&S analyzer ready");
        RohdeAnalyzer {
            instrument,
            definition,
            info,
        }
    }

    /// Static definition of the driven model.
    pub fn definition(&self) -> &AnalyzerDefinition {
        &self.definition
    }

    /// The underlying SCPI channel, for commands this driver does not wrap.
    pub fn instrument(&self) -> &ScpiInstrument {
        &self.instrument
    }
}

#[async_trait]
impl SpectrumAnalyzer for RohdeAnalyzer {
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

    // The FSU dialect addresses one implicit marker; the index is ignored.

    async fn get_marker_frequency(&self, marker: u8) -> Result<f64> {
        trace!(marker, "single-marker dialect, using marker 1");
        commands::MARKER_FREQUENCY.get(&self.instrument).await
    }

    async fn get_marker_amplitude(&self, marker: u8) -> Result<f64> {
        trace!(marker, "single-marker dialect, using marker 1");
        commands::MARKER_AMPLITUDE.get(&self.instrument).await
    }

    async fn set_move_marker_peak(&self, marker: u8) -> Result<()> {
        trace!(marker, "single-marker dialect, using marker 1");
        self.instrument.write(commands::MARKER_PEAK).await
    }

    async fn get_sweeptime(&self) -> Result<f64> {
        commands::SWEEP_TIME.get(&self.instrument).await
    }

    async fn set_sweep_single(&self, single: bool) -> Result<()> {
        let command = if single {
            commands::SWEEP_SINGLE
        } else {
            commands::SWEEP_CONTINUOUS
        };
        self.instrument.write(command).await
    }

    async fn get_trace(&self, trace: u8) -> Result<Vec<f64>> {
        let query = commands::cmd_read_trace(trace)?;
        let reply = self.instrument.ask(&query).await?;
        let values = commands::parse_trace(&reply)?;
        debug!(trace, points = values.len(), "trace read");
        Ok(values)
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

    async fn set_resolution_bw_auto(&self, on: bool) -> Result<()> {
        let command = if on {
            commands::RESOLUTION_BW_AUTO_ON
        } else {
            commands::RESOLUTION_BW_AUTO_OFF
        };
        self.instrument.write(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RohdeBuilder;
    use crate::models::fsup50;
    use esalib_core::Error;
    use esalib_test_harness::{MockTransport, SimulatedAnalyzer};
    use std::time::Duration;

    const IDN: &[u8] = b"Rohde&Schwarz,FSUP-50,1166.3505K50/100123,4.71\n";

    async fn with_mock(mock: &mut MockTransport) -> RohdeAnalyzer {
        mock.expect(b"*IDN?\n", IDN);
        RohdeBuilder::new(fsup50())
            .command_timeout(Duration::from_millis(100))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap()
    }

    async fn simulated() -> (RohdeAnalyzer, SimulatedAnalyzer) {
        let sim = SimulatedAnalyzer::fsup50();
        let analyzer = RohdeBuilder::new(fsup50())
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
        assert_eq!(mock.sent_lines(), vec!["*IDN?", "*RST", "*OPC?"]);
    }

    #[tokio::test]
    async fn set_start_frequency_waits_for_completion() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"FREQ:STAR 10.000000\n");
        mock.expect(b"*OPC?\n", b"1\n");

        analyzer.set_start_frequency(10.0).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn out_of_range_start_sends_nothing() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;

        let result = analyzer.set_start_frequency(-1.0).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn resolution_bw_get_returns_value() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect(b"BAND?\n", b"3000000\n");

        assert_eq!(analyzer.get_resolution_bw().await.unwrap(), 3e6);
    }

    #[tokio::test]
    async fn marker_index_is_ignored() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"CALC:MARK:MAX\n");
        mock.expect(b"CALC:MARK:X?\n", b"1.0E+009\n");
        mock.expect(b"CALC:MARK:Y?\n", b"-23.5\n");

        analyzer.set_move_marker_peak(2).await.unwrap();
        assert_eq!(analyzer.get_marker_frequency(2).await.unwrap(), 1e9);
        assert_eq!(analyzer.get_marker_amplitude(4).await.unwrap(), -23.5);
    }

    #[tokio::test]
    async fn sweep_single_and_continuous() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect_write(b"INIT:CONT OFF\n");
        mock.expect_write(b"INIT:CONT ON\n");

        analyzer.set_sweep_single(true).await.unwrap();
        analyzer.set_sweep_single(false).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn trace_readout() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;
        mock.expect(b"TRAC? TRACE1\n", b"-90.5,-20.25,-88\n");

        assert_eq!(
            analyzer.get_trace(1).await.unwrap(),
            vec![-90.5, -20.25, -88.0]
        );
        assert!(matches!(
            analyzer.get_trace(5).await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn keysight_only_operations_unsupported() {
        let mut mock = MockTransport::new();
        let analyzer = with_mock(&mut mock).await;

        assert!(matches!(
            analyzer.get_center_frequency().await,
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            analyzer.set_correction_noise_floor(true).await,
            Err(Error::Unsupported(_))
        ));
        assert_eq!(mock.sent_data().len(), 1);
    }

    /// Bounds, interior points and near-bound values of a declared range.
    fn spread(min: f64, max: f64) -> [f64; 5] {
        [min, min + 1.0, (min + max) / 2.0, max - 1.0, max]
    }

    #[tokio::test]
    async fn round_trip_against_simulator() {
        let (analyzer, sim) = simulated().await;

        for value in spread(0.0, 50e9) {
            analyzer.set_start_frequency(value).await.unwrap();
            assert_eq!(analyzer.get_start_frequency().await.unwrap(), value);
        }
        // No declared range: anything the instrument accepts goes through.
        for value in [0.0, 9e3, 26.5e9, 50e9, 67e9] {
            analyzer.set_stop_frequency(value).await.unwrap();
            assert_eq!(analyzer.get_stop_frequency().await.unwrap(), value);
        }
        for value in spread(1.0, 10e6) {
            analyzer.set_video_bw(value).await.unwrap();
            assert_eq!(analyzer.get_video_bw().await.unwrap(), value);
        }
        for value in spread(10.0, 50e6) {
            analyzer.set_resolution_bw(value).await.unwrap();
            assert_eq!(analyzer.get_resolution_bw().await.unwrap(), value);
        }
        for &points in commands::SWEEP_POINT_CHOICES {
            assert_eq!(analyzer.set_sweep_points(points).await.unwrap(), points);
            assert_eq!(analyzer.get_sweep_points().await.unwrap(), points);
        }

        analyzer.set_video_bw(300.0).await.unwrap();
        assert_eq!(sim.setting("BAND:VID").as_deref(), Some("300.000000"));
        assert_eq!(analyzer.get_trace(1).await.unwrap().len(), 8001);
    }

    #[tokio::test]
    async fn out_of_range_values_send_nothing() {
        let (analyzer, sim) = simulated().await;
        let sent_before = sim.received().len();

        for value in [-0.5, 50e9 + 0.5, 60e9] {
            assert!(matches!(
                analyzer.set_start_frequency(value).await,
                Err(Error::Validation(_))
            ));
        }
        for value in [0.5, 10e6 + 0.5] {
            assert!(matches!(analyzer.set_video_bw(value).await, Err(Error::Validation(_))));
        }
        for value in [9.5, 50e6 + 0.5] {
            assert!(matches!(
                analyzer.set_resolution_bw(value).await,
                Err(Error::Validation(_))
            ));
        }
        for points in [0, 124, 126, 200, 8000, 8002, 40001] {
            assert!(matches!(
                analyzer.set_sweep_points(points).await,
                Err(Error::Validation(_))
            ));
        }

        assert_eq!(sim.received().len(), sent_before);
    }

    #[tokio::test]
    async fn property_by_name() {
        let (analyzer, _sim) = simulated().await;

        analyzer.set_property("resolution_bw", 1e3).await.unwrap();
        assert_eq!(analyzer.get_property("resolution_bw").await.unwrap(), 1e3);
        analyzer.set_property("sweep_points", 401.0).await.unwrap();
        assert_eq!(analyzer.get_property("sweep_points").await.unwrap(), 401.0);

        assert!(matches!(
            analyzer.get_property("attenuation").await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(analyzer.property_names().contains(&"marker_amplitude"));
    }

    #[tokio::test]
    async fn close_closes_transport() {
        let (analyzer, sim) = simulated().await;
        analyzer.close().await.unwrap();
        assert!(!sim.is_connected());
    }
}
