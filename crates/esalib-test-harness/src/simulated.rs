//! A stateful, in-memory SCPI instrument.
//!
//! [`SimulatedAnalyzer`] parses every program message it receives. A
//! setting command (`HEADER value`) stores the value under its header; a
//! query (`HEADER?`) answers with the stored value, or with a default
//! registered via [`with_setting`](SimulatedAnalyzer::with_setting), or
//! `0`. The IEEE 488.2 common commands and trace queries are handled
//! specially:
//!
//! | Message          | Behavior                                             |
//! |------------------|------------------------------------------------------|
//! | `*IDN?`          | the identity string passed to [`new`](SimulatedAnalyzer::new) |
//! | `*OPC?`          | `1`                                                  |
//! | `*RST`           | clears all stored settings                           |
//! | `*CLS`           | ignored                                              |
//! | `...TRAC...?`    | a comma-separated trace, one value per sweep point   |
//!
//! Units appended to numeric settings (`300.000000Hz`) are stripped before
//! the value is stored, so `BAND:VID 300.000000Hz` followed by `BAND:VID?`
//! answers `300.000000`.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;

/// Sweep points used for trace replies when none has been set.
const DEFAULT_SWEEP_POINTS: usize = 401;

#[derive(Debug)]
struct State {
    identity: String,
    defaults: HashMap<String, String>,
    settings: HashMap<String, String>,
    received: Vec<String>,
    outbox: VecDeque<u8>,
    partial: Vec<u8>,
    connected: bool,
}

impl State {
    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.received.push(line.to_string());

        let (header, argument) = match line.split_once(char::is_whitespace) {
            Some((h, a)) => (h, a.trim()),
            None => (line, ""),
        };
        let header = header.to_ascii_uppercase();

        match header.as_str() {
            "*IDN?" => {
                let identity = self.identity.clone();
                self.reply(&identity);
            }
            "*OPC?" => self.reply("1"),
            "*RST" => self.settings.clear(),
            "*CLS" => {}
            h if h.ends_with('?') && h.contains("TRAC") => {
                let trace = self.trace();
                self.reply(&trace);
            }
            h if h.ends_with('?') => {
                let key = h.trim_end_matches('?');
                let value = self
                    .settings
                    .get(key)
                    .or_else(|| self.defaults.get(key))
                    .cloned()
                    .unwrap_or_else(|| "0".to_string());
                self.reply(&value);
            }
            h => {
                self.settings.insert(h.to_string(), strip_unit(argument));
            }
        }
    }

    fn reply(&mut self, text: &str) {
        self.outbox.extend(text.as_bytes());
        self.outbox.push_back(b'\n');
    }

    fn sweep_points(&self) -> usize {
        self.settings
            .iter()
            .chain(self.defaults.iter())
            .find(|(k, _)| k.ends_with("SWE:POIN"))
            .and_then(|(_, v)| v.parse::<f64>().ok())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_SWEEP_POINTS)
    }

    // Flat noise floor with a single peak in the middle of the span.
    fn trace(&self) -> String {
        let points = self.sweep_points();
        let peak = points / 2;
        (0..points)
            .map(|i| {
                let level = if i == peak {
                    -20.0
                } else {
                    -90.0 + (i % 7) as f64 * 0.5
                };
                format!("{level:.2}")
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Strip a trailing alphabetic unit from a numeric argument.
fn strip_unit(argument: &str) -> String {
    let trimmed = argument.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
        trimmed.to_string()
    } else {
        argument.to_string()
    }
}

/// An in-memory analyzer that remembers what it was told.
///
/// Cloneable; all clones share state, so a test can keep a handle to
/// inspect [`received`](Self::received) after handing the transport to a
/// driver.
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    state: Arc<Mutex<State>>,
}

impl SimulatedAnalyzer {
    /// Create a simulated instrument answering `*IDN?` with `identity`.
    pub fn new(identity: &str) -> Self {
        SimulatedAnalyzer {
            state: Arc::new(Mutex::new(State {
                identity: identity.to_string(),
                defaults: HashMap::new(),
                settings: HashMap::new(),
                received: Vec::new(),
                outbox: VecDeque::new(),
                partial: Vec::new(),
                connected: true,
            })),
        }
    }

    /// A simulated Rohde & Schwarz FSUP50.
    pub fn fsup50() -> Self {
        Self::new("Rohde&Schwarz,FSUP-50,1166.3505K50/100123,4.71")
    }

    /// A simulated Keysight N9030A PXA.
    pub fn n9030a() -> Self {
        Self::new("Keysight Technologies,N9030A,MY51234567,A.33.03")
            .with_setting("INST:CAT?", "\"SA 1,PNOISE 14,NFIG 219\"")
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register the reply to a query for a header that has not been set.
    ///
    /// The header may be given with or without the trailing `?`.
    pub fn with_setting(self, header: &str, value: &str) -> Self {
        let key = header.trim_end_matches('?').to_ascii_uppercase();
        self.state().defaults.insert(key, value.to_string());
        self
    }

    /// The current value stored for a header, if any was set.
    pub fn setting(&self, header: &str) -> Option<String> {
        self.state()
            .settings
            .get(&header.to_ascii_uppercase())
            .cloned()
    }

    /// Every program message received so far, in order.
    pub fn received(&self) -> Vec<String> {
        self.state().received.clone()
    }

    /// Whether the simulated instrument is connected.
    pub fn is_connected(&self) -> bool {
        self.state().connected
    }
}

#[async_trait]
impl Transport for SimulatedAnalyzer {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.partial.extend_from_slice(data);
        while let Some(pos) = state.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = state.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).into_owned();
            state.handle_line(&text);
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.outbox.is_empty() {
            return Err(Error::Timeout);
        }

        let n = state.outbox.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.outbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.outbox.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        SimulatedAnalyzer::is_connected(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn query(sim: &mut SimulatedAnalyzer, command: &str) -> String {
        sim.send(format!("{command}\n").as_bytes()).await.unwrap();
        let mut buf = vec![0u8; 1 << 16];
        let n = sim
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        String::from_utf8(buf[..n].to_vec())
            .unwrap()
            .trim_end()
            .to_string()
    }

    #[tokio::test]
    async fn answers_identity_and_opc() {
        let mut sim = SimulatedAnalyzer::fsup50();
        assert!(query(&mut sim, "*IDN?").await.starts_with("Rohde&Schwarz,FSUP-50"));
        assert_eq!(query(&mut sim, "*OPC?").await, "1");
    }

    #[tokio::test]
    async fn echoes_settings_without_units() {
        let mut sim = SimulatedAnalyzer::fsup50();
        sim.send(b"BAND:VID 300.000000Hz\n").await.unwrap();
        assert_eq!(query(&mut sim, "BAND:VID?").await, "300.000000");
        assert_eq!(sim.setting("band:vid").as_deref(), Some("300.000000"));
    }

    #[tokio::test]
    async fn unset_query_uses_default_then_zero() {
        let mut sim = SimulatedAnalyzer::n9030a();
        assert!(query(&mut sim, "INST:CAT?").await.contains("SA"));
        assert_eq!(query(&mut sim, "CALC:MARK1:Y?").await, "0");
    }

    #[tokio::test]
    async fn reset_clears_settings() {
        let mut sim = SimulatedAnalyzer::fsup50();
        sim.send(b"FREQ:STAR 10.000000\n*RST\n").await.unwrap();
        assert_eq!(query(&mut sim, "FREQ:STAR?").await, "0");
        assert_eq!(sim.received(), vec!["FREQ:STAR 10.000000", "*RST", "FREQ:STAR?"]);
    }

    #[tokio::test]
    async fn trace_length_follows_sweep_points() {
        let mut sim = SimulatedAnalyzer::fsup50();
        sim.send(b"SWE:POIN 125\n").await.unwrap();
        let trace = query(&mut sim, "TRAC? TRACE1").await;
        assert_eq!(trace.split(',').count(), 125);
    }

    #[tokio::test]
    async fn receive_without_reply_times_out() {
        let mut sim = SimulatedAnalyzer::fsup50();
        sim.send(b"INIT:CONT OFF\n").await.unwrap();
        let mut buf = [0u8; 8];
        let result = sim.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn closed_rejects_io() {
        let mut sim = SimulatedAnalyzer::fsup50();
        sim.close().await.unwrap();
        assert!(matches!(sim.send(b"*IDN?\n").await, Err(Error::NotConnected)));
    }
}
