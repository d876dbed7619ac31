//! KeysightBuilder -- fluent builder for [`KeysightAnalyzer`] instances.
//!
//! # Example
//!
//! ```no_run
//! use esalib_keysight::builder::KeysightBuilder;
//! use esalib_keysight::models::n9030a;
//!
//! # async fn example() -> esalib_core::Result<()> {
//! let _analyzer = KeysightBuilder::new(n9030a())
//!     .build("TCPIP0::pxa.lab::5025::SOCKET")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use esalib_core::error::Result;
use esalib_core::transport::Transport;
use esalib_core::types::AnalyzerDefinition;
use esalib_scpi::{DEFAULT_COMMAND_TIMEOUT, ScpiInstrument};
use esalib_transport::{OpenOptions, ResourceAddress};

use crate::analyzer::KeysightAnalyzer;

/// Fluent builder for [`KeysightAnalyzer`].
pub struct KeysightBuilder {
    definition: AnalyzerDefinition,
    command_timeout: Duration,
    open_options: OpenOptions,
    clear_status: bool,
}

impl KeysightBuilder {
    /// Create a builder for the given model.
    pub fn new(definition: AnalyzerDefinition) -> Self {
        KeysightBuilder {
            definition,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            open_options: OpenOptions::default(),
            clear_status: false,
        }
    }

    /// Time to wait for one response line (default: 3s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Options used by [`build`](Self::build) to open the resource.
    pub fn open_options(mut self, options: OpenOptions) -> Self {
        self.open_options = options;
        self
    }

    /// Send `*CLS` after identification to drop errors queued by a
    /// previous session (default: off).
    pub fn clear_status(mut self, enabled: bool) -> Self {
        self.clear_status = enabled;
        self
    }

    /// Build with a caller-provided transport.
    pub async fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<KeysightAnalyzer> {
        let instrument = ScpiInstrument::connect(transport, self.command_timeout).await?;
        if self.clear_status {
            instrument.clear_status().await?;
        }
        Ok(KeysightAnalyzer::new(instrument, self.definition))
    }

    /// Open the resource at `address` and build on top of it.
    pub async fn build(self, address: &str) -> Result<KeysightAnalyzer> {
        let address: ResourceAddress = address.parse()?;
        let transport = address.open(&self.open_options).await?;
        self.build_with_transport(transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::n9030a;
    use esalib_core::{Error, Manufacturer, SpectrumAnalyzer};
    use esalib_test_harness::MockTransport;

    const IDN: &[u8] = b"Keysight Technologies,N9030A,MY51234567,A.33.03\n";

    #[tokio::test]
    async fn build_defaults() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", IDN);

        let analyzer = KeysightBuilder::new(n9030a())
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        assert_eq!(analyzer.info().manufacturer, Manufacturer::Keysight);
        assert_eq!(analyzer.info().identity.firmware, "A.33.03");
    }

    #[tokio::test]
    async fn build_with_clear_status() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", IDN);
        mock.expect_write(b"*CLS\n");

        KeysightBuilder::new(n9030a())
            .clear_status(true)
            .command_timeout(Duration::from_millis(100))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();

        assert_eq!(mock.sent_lines(), vec!["*IDN?", "*CLS"]);
    }

    #[tokio::test]
    async fn build_gpib_is_unsupported() {
        let result = KeysightBuilder::new(n9030a()).build("GPIB0::18::INSTR").await;
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}
