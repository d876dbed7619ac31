//! The SCPI instrument base shared by all analyzer drivers.
//!
//! [`ScpiInstrument`] owns the transport of one instrument and turns it
//! into a line-oriented command channel: [`write`](ScpiInstrument::write)
//! sends a program message, [`ask`](ScpiInstrument::ask) sends a query and
//! reads exactly one response line. On top of that it provides the IEEE
//! 488.2 common commands every analyzer understands (`*IDN?`, `*RST`,
//! `*OPC?`, `*CLS`).
//!
//! The transport sits behind an async mutex that is held for a whole
//! write/read exchange, so concurrent callers are serialized. A query that
//! timed out leaves the channel out of step with the instrument; the late
//! reply is drained before the next query is sent, so it can never be
//! handed to the wrong query.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;
use esalib_core::types::Identity;

use crate::protocol::{self, DecodeResult};

/// Identification query.
pub const IDN_QUERY: &str = "*IDN?";
/// Reset to manufacturer defaults.
pub const RESET: &str = "*RST";
/// Operation complete query, the completion-wait handshake.
pub const OPC_QUERY: &str = "*OPC?";
/// Clear the status registers and error queue.
pub const CLEAR_STATUS: &str = "*CLS";

/// Default time to wait for one response line.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

/// Maximum receive buffer before a runaway reply is abandoned.
///
/// ASCII traces of 40001 points at ~15 bytes each stay well below this.
const MAX_LINE: usize = 1 << 20;

/// Last-known state of the command channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentStatus {
    /// Number of program messages sent since construction.
    pub commands_sent: u64,
    /// The most recent program message, without terminator.
    pub last_command: Option<String>,
    /// Result of the most recent completion-wait handshake.
    pub last_completion: Option<u32>,
}

struct Channel {
    transport: Box<dyn Transport>,
    status: InstrumentStatus,
    /// Received bytes not yet consumed as a line.
    rx_buf: Vec<u8>,
    /// Queries whose reply was not read before their timeout.
    unanswered: usize,
}

impl Channel {
    fn new(transport: Box<dyn Transport>) -> Self {
        Channel {
            transport,
            status: InstrumentStatus::default(),
            rx_buf: Vec::new(),
            unanswered: 0,
        }
    }

    async fn send_line(&mut self, command: &str) -> Result<()> {
        let bytes = protocol::encode_line(command);
        trace!(data = ?bytes, "sending SCPI line");
        self.transport.send(&bytes).await?;
        self.status.commands_sent += 1;
        self.status.last_command = Some(command.trim_end().to_string());
        Ok(())
    }

    /// Read one line. Bytes past the terminator stay buffered for the next
    /// read, and so do the bytes of a line cut off by the timeout.
    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let mut buf = [0u8; 4096];
        let transport = &mut self.transport;
        let rx_buf = &mut self.rx_buf;

        let read = async {
            loop {
                match protocol::decode_line(rx_buf) {
                    DecodeResult::Line { line, consumed } => {
                        rx_buf.drain(..consumed);
                        return Ok(line);
                    }
                    DecodeResult::Invalid(consumed) => {
                        rx_buf.drain(..consumed);
                        return Err(Error::Parse("response line is not valid UTF-8".into()));
                    }
                    DecodeResult::Incomplete if rx_buf.len() > MAX_LINE => {
                        rx_buf.clear();
                        return Err(Error::Transport(format!(
                            "no line terminator within {MAX_LINE} bytes"
                        )));
                    }
                    DecodeResult::Incomplete => {}
                }
                let n = transport.receive(&mut buf, timeout).await?;
                rx_buf.extend_from_slice(&buf[..n]);
            }
        };

        match tokio::time::timeout(timeout, read).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Bring the channel back in step before a new query: read and drop the
    /// replies of earlier queries that timed out, then any unsolicited bytes.
    async fn resync(&mut self, timeout: Duration) -> Result<()> {
        while self.unanswered > 0 {
            match self.read_line(timeout).await {
                Ok(stale) => {
                    warn!(reply = %stale, "discarding late reply to a timed-out query");
                    self.unanswered -= 1;
                }
                Err(Error::Timeout) => {
                    warn!(
                        missing = self.unanswered,
                        "late replies never arrived, assuming they were lost"
                    );
                    self.unanswered = 0;
                }
                Err(e) => return Err(e),
            }
        }
        if !self.rx_buf.is_empty() {
            warn!(discarded = self.rx_buf.len(), "discarding unsolicited input");
            self.rx_buf.clear();
        }
        Ok(())
    }

    async fn query(&mut self, command: &str, timeout: Duration) -> Result<String> {
        self.resync(timeout).await?;
        self.send_line(command).await?;
        self.unanswered += 1;
        let line = self.read_line(timeout).await?;
        self.unanswered -= 1;
        trace!(command, reply = %line, "SCPI query answered");
        Ok(line)
    }
}

/// A connected SCPI instrument.
///
/// Constructed once per resource by a driver builder; the identity is
/// queried during [`connect`](Self::connect) and construction fails if the
/// instrument does not answer with a well-formed `*IDN?` reply.
pub struct ScpiInstrument {
    channel: Mutex<Channel>,
    identity: Identity,
    command_timeout: Duration,
}

impl ScpiInstrument {
    /// Take ownership of `transport`, query `*IDN?` and parse the identity.
    pub async fn connect(transport: Box<dyn Transport>, command_timeout: Duration) -> Result<Self> {
        let mut channel = Channel::new(transport);

        let reply = channel.query(IDN_QUERY, command_timeout).await?;
        let identity: Identity = reply.parse()?;
        debug!(%identity, "instrument identified");

        Ok(ScpiInstrument {
            channel: Mutex::new(channel),
            identity,
            command_timeout,
        })
    }

    /// The identity parsed at construction.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Time allowed for one response line.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// A snapshot of the command channel state.
    pub async fn status(&self) -> InstrumentStatus {
        self.channel.lock().await.status.clone()
    }

    /// Send a program message verbatim. No response is read.
    pub async fn write(&self, command: &str) -> Result<()> {
        debug!(command, "SCPI write");
        self.channel.lock().await.send_line(command).await
    }

    /// Send a query and return the single response line (without
    /// terminator).
    pub async fn ask(&self, command: &str) -> Result<String> {
        debug!(command, "SCPI query");
        self.channel
            .lock()
            .await
            .query(command, self.command_timeout)
            .await
    }

    /// Perform the completion-wait handshake (`*OPC?`).
    ///
    /// Returns `0` if the instrument confirmed all operations complete,
    /// non-zero otherwise. Blocks until the reply arrives or the command
    /// timeout expires.
    pub async fn wait_to_complete(&self) -> Result<u32> {
        let mut channel = self.channel.lock().await;
        let reply = channel.query(OPC_QUERY, self.command_timeout).await?;
        let code = protocol::completion_code(&reply)?;
        channel.status.last_completion = Some(code);
        debug!(code, "operation complete handshake");
        Ok(code)
    }

    /// Reset to manufacturer defaults and wait for completion.
    ///
    /// Sends `*RST` followed by exactly one `*OPC?`.
    pub async fn reset(&self) -> Result<u32> {
        self.write(RESET).await?;
        self.wait_to_complete().await
    }

    /// Query and parse the identity again.
    pub async fn identify(&self) -> Result<Identity> {
        self.ask(IDN_QUERY).await?.parse()
    }

    /// Clear the status registers and error queue (`*CLS`).
    pub async fn clear_status(&self) -> Result<()> {
        self.write(CLEAR_STATUS).await
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        debug!(identity = %self.identity, "closing instrument");
        self.channel.lock().await.transport.close().await
    }
}
