//! RohdeBuilder -- fluent builder for constructing [`RohdeAnalyzer`] instances.
//!
//! # Example
//!
//! ```no_run
//! use esalib_rohde::builder::RohdeBuilder;
//! use esalib_rohde::models::fsup50;
//! use std::time::Duration;
//!
//! # async fn example() -> esalib_core::Result<()> {
//! let analyzer = RohdeBuilder::new(fsup50())
//!     .command_timeout(Duration::from_secs(10))
//!     .build("TCPIP0::192.168.1.20::5025::SOCKET")
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

use crate::analyzer::RohdeAnalyzer;

/// Fluent builder for [`RohdeAnalyzer`].
pub struct RohdeBuilder {
    definition: AnalyzerDefinition,
    command_timeout: Duration,
    open_options: OpenOptions,
}

impl RohdeBuilder {
    /// Create a builder for the given model.
    pub fn new(definition: AnalyzerDefinition) -> Self {
        RohdeBuilder {
            definition,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            open_options: OpenOptions::default(),
        }
    }

    /// Time to wait for one response line (default: 3s).
    ///
    /// `*OPC?` after a long sweep is answered only when the sweep ends, so
    /// slow sweeps need a longer timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Options used by [`build`](Self::build) to open the resource.
    pub fn open_options(mut self, options: OpenOptions) -> Self {
        self.open_options = options;
        self
    }

    /// Build with a caller-provided transport.
    ///
    /// Queries `*IDN?`; construction fails if the instrument does not
    /// answer with a well-formed identity.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<RohdeAnalyzer> {
        let instrument = ScpiInstrument::connect(transport, self.command_timeout).await?;
        Ok(RohdeAnalyzer::new(instrument, self.definition))
    }

    /// Open the resource at `address` and build on top of it.
    pub async fn build(self, address: &str) -> Result<RohdeAnalyzer> {
        let address: ResourceAddress = address.parse()?;
        let transport = address.open(&self.open_options).await?;
        self.build_with_transport(transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fsup50;
    use esalib_core::{Error, SpectrumAnalyzer};
    use esalib_test_harness::MockTransport;

    #[tokio::test]
    async fn build_queries_identity() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", b"Rohde&Schwarz,FSUP-50,1166.3505K50/100123,4.71\n");

        let analyzer = RohdeBuilder::new(fsup50())
            .command_timeout(Duration::from_millis(100))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();

        let info = analyzer.info();
        assert_eq!(info.driver_name, "FSUP50");
        assert_eq!(info.identity.model, "FSUP-50");
        assert_eq!(info.identity.serial, "1166.3505K50/100123");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn build_with_malformed_identity_fails() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", b"FSUP\n");

        let result = RohdeBuilder::new(fsup50())
            .build_with_transport(Box::new(mock))
            .await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn build_from_bad_address_fails_before_io() {
        let result = RohdeBuilder::new(fsup50()).build("not an address").await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
