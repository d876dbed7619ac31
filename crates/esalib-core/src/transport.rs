//! Transport trait for instrument communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an analyzer.
//! Implementations exist for raw SCPI sockets over TCP, serial ports, and
//! mock transports for testing.
//!
//! Line framing (the `\n` terminator of SCPI program and response messages)
//! is handled by the instrument base in `esalib-scpi`, which operates on a
//! `Transport` rather than on a socket directly. This enables both real
//! hardware control and deterministic unit testing with `MockTransport`
//! from the `esalib-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to an instrument.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. The transport is owned exclusively by one instrument instance.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the instrument.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying link (socket, serial TX buffer).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the instrument into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
