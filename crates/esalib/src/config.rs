//! Facade configuration.
//!
//! An [`EsaConfig`] names the driver to load and carries the label used in
//! log output. It is usually one table of a test bench TOML file:
//!
//! ```toml
//! [tx_esa]
//! devicedriver = "FSUP50"
//! label = "TX_ESA"
//! timeout_ms = 10000
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use esalib_core::error::{Error, Result};

/// Configuration for one [`Esa`](crate::Esa).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EsaConfig {
    /// Driver name, e.g. `"FSUP50"` or `"N9030A"`. Matched case-insensitively.
    pub devicedriver: String,

    /// Label identifying the instrument in log output.
    #[serde(default)]
    pub label: String,

    /// Per-reply timeout; the driver default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Any other keys, kept untouched for callers that need them.
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

impl EsaConfig {
    pub fn new(devicedriver: impl Into<String>, label: impl Into<String>) -> Self {
        EsaConfig {
            devicedriver: devicedriver.into(),
            label: label.into(),
            timeout_ms: None,
            options: BTreeMap::new(),
        }
    }

    /// Set the per-reply timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse a configuration from an already-loaded TOML value, such as one
    /// table of a larger bench file.
    pub fn from_toml_value(value: &toml::Value) -> Result<Self> {
        value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(e.to_string()))
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
