//! Mock transport for deterministic testing of SCPI command sequences.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command formatting, write
//! ordering and reply parsing without a real instrument.
//!
//! The mock is cheaply cloneable and all clones share state, so a test can
//! hand one clone to a driver (which takes ownership of its transport) and
//! keep another to inspect what was sent.
//!
//! # Example
//!
//! ```
//! use esalib_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the driver sends this query, answer with this line.
//! mock.expect(b"FREQ:STAR?\n", b"1.0E+006\n");
//! // A program message with no response.
//! mock.expect_write(b"INIT:CONT OFF\n");
//! // A reply that only becomes readable 150 ms after the query.
//! mock.expect_delayed(b"*OPC?\n", b"1\n", std::time::Duration::from_millis(150));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return when the matching request is received, if any.
    response: Option<Vec<u8>>,
    /// How long after the request the response becomes readable.
    delay: Duration,
}

#[derive(Debug)]
struct State {
    expectations: VecDeque<Expectation>,
    pending_response: Option<Vec<u8>>,
    pending_ready_at: Option<Instant>,
    response_cursor: usize,
    chunk_size: Option<usize>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
}

/// A mock [`Transport`] for testing drivers without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation. The
/// corresponding response, if any, is then returned by subsequent
/// `receive()` calls.
///
/// If the data does not match or the queue is exhausted, `send()` returns
/// [`Error::Transport`]. A `receive()` with nothing pending returns
/// [`Error::Timeout`] immediately.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(State {
                expectations: VecDeque::new(),
                pending_response: None,
                pending_ready_at: None,
                response_cursor: 0,
                chunk_size: None,
                connected: true,
                sent_log: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an expected query and the response to return for it.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: Some(response.to_vec()),
            delay: Duration::ZERO,
        });
    }

    /// Add an expected query whose response only becomes readable `delay`
    /// after the query was sent, like a slow instrument.
    ///
    /// A `receive()` issued earlier waits for it, so a caller with a
    /// shorter timeout gives up while the reply is still in flight.
    pub fn expect_delayed(&mut self, request: &[u8], response: &[u8], delay: Duration) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: Some(response.to_vec()),
            delay,
        });
    }

    /// Add an expected program message that produces no response.
    pub fn expect_write(&mut self, request: &[u8]) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: None,
            delay: Duration::ZERO,
        });
    }

    /// Deliver responses at most `size` bytes per `receive()` call, to
    /// exercise reassembly of replies split across reads.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.state().chunk_size = Some(size.max(1));
    }

    /// Return a copy of all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Return everything sent so far as text lines, terminators stripped.
    pub fn sent_lines(&self) -> Vec<String> {
        self.state()
            .sent_log
            .iter()
            .map(|data| {
                String::from_utf8_lossy(data)
                    .trim_end_matches(['\r', '\n'])
                    .to_string()
            })
            .collect()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }

    /// Whether the mock is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state().connected
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());

        let Some(expectation) = state.expectations.pop_front() else {
            return Err(Error::Transport(format!(
                "no more expectations in mock transport, got {:?}",
                String::from_utf8_lossy(data)
            )));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Transport(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }
        state.pending_ready_at = Some(Instant::now() + expectation.delay);
        state.pending_response = expectation.response;
        state.response_cursor = 0;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let ready_at = {
            let state = self.state();
            if !state.connected {
                return Err(Error::NotConnected);
            }
            state.pending_response.as_ref().and(state.pending_ready_at)
        };
        if let Some(ready_at) = ready_at {
            tokio::time::sleep_until(ready_at).await;
        }

        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        let Some(response) = state.pending_response.take() else {
            return Err(Error::Timeout);
        };
        let remaining = &response[state.response_cursor..];
        if remaining.is_empty() {
            state.response_cursor = 0;
            return Err(Error::Timeout);
        }

        let limit = state.chunk_size.unwrap_or(usize::MAX).min(buf.len());
        let n = remaining.len().min(limit);
        buf[..n].copy_from_slice(&remaining[..n]);
        state.response_cursor += n;
        if state.response_cursor >= response.len() {
            state.response_cursor = 0;
        } else {
            state.pending_response = Some(response);
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.pending_response = None;
        state.response_cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        MockTransport::is_connected(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"SWE:TIME?\n", b"0.025\n");

        mock.send(b"SWE:TIME?\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"0.025\n");
    }

    #[tokio::test]
    async fn mock_transport_clones_share_state() {
        let mut mock = MockTransport::new();
        mock.expect_write(b"*CLS\n");

        let mut owned = mock.clone();
        owned.send(b"*CLS\n").await.unwrap();

        assert_eq!(mock.sent_data(), vec![b"*CLS\n".to_vec()]);
        assert_eq!(mock.sent_lines(), vec!["*CLS".to_string()]);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mock_transport_write_has_no_response() {
        let mut mock = MockTransport::new();
        mock.expect_write(b"INIT:CONT OFF\n");
        mock.send(b"INIT:CONT OFF\n").await.unwrap();

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"FREQ:STAR?\n", b"0\n");

        let result = mock.send(b"FREQ:STOP?\n").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();

        let result = mock.send(b"*RST\n").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn mock_transport_chunked_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", b"ABCDEF\n");
        mock.set_chunk_size(3);
        mock.send(b"*IDN?\n").await.unwrap();

        let mut buf = [0u8; 64];
        let mut got = Vec::new();
        for _ in 0..3 {
            let n = mock
                .receive(&mut buf, Duration::from_millis(10))
                .await
                .unwrap();
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, b"ABCDEF\n");

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_delayed_response() {
        let mut mock = MockTransport::new();
        mock.expect_delayed(b"*OPC?\n", b"1\n", Duration::from_millis(60));
        mock.send(b"*OPC?\n").await.unwrap();

        let mut buf = [0u8; 8];
        let early = tokio::time::timeout(
            Duration::from_millis(20),
            mock.receive(&mut buf, Duration::from_millis(20)),
        )
        .await;
        assert!(early.is_err(), "reply must not be readable yet");

        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"1\n");
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(b"*RST\n").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_transport_set_connected() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }
}
