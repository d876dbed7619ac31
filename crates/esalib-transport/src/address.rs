//! VISA-style resource addresses.
//!
//! Instruments are addressed the way VISA names them, so configuration
//! files written for other tooling keep working:
//!
//! | Address                                | Transport                     |
//! |----------------------------------------|-------------------------------|
//! | `TCPIP0::192.168.1.20::5025::SOCKET`   | raw SCPI socket               |
//! | `TCPIP::analyzer.lab::SOCKET`          | raw SCPI socket, port 5025    |
//! | `ASRL/dev/ttyUSB0::INSTR`, `ASRL3::INSTR` | serial port (`COM3`)       |
//! | `GPIB0::20::INSTR`                     | rejected: needs a VISA library |
//!
//! Keywords are case-insensitive. A bare `host:port` is accepted as a
//! socket address too.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;

use crate::serial::{SerialConfig, SerialTransport};
use crate::tcp::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_SCPI_PORT, TcpTransport};

/// A parsed instrument resource address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAddress {
    /// Raw SCPI socket.
    Socket { host: String, port: u16 },
    /// Serial port, by OS name.
    Serial { port: String },
    /// GPIB primary address on a board.
    Gpib { board: u8, primary: u8 },
}

/// Settings used when opening a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Time allowed for establishing a socket connection.
    pub connect_timeout: Duration,
    /// Line settings for serial resources.
    pub serial: SerialConfig,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            serial: SerialConfig::default(),
        }
    }
}

impl ResourceAddress {
    /// Open the transport this address names.
    pub async fn open(&self, options: &OpenOptions) -> Result<Box<dyn Transport>> {
        tracing::debug!(address = %self, "Opening resource");
        match self {
            ResourceAddress::Socket { host, port } => {
                let addr = format!("{host}:{port}");
                let transport = TcpTransport::connect_with_timeout(&addr, options.connect_timeout).await?;
                Ok(Box::new(transport))
            }
            ResourceAddress::Serial { port } => {
                let transport = SerialTransport::open_with_config(port, &options.serial).await?;
                Ok(Box::new(transport))
            }
            ResourceAddress::Gpib { .. } => Err(Error::Unsupported(format!(
                "{self}: GPIB resources require a VISA library"
            ))),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAddress::Socket { host, port } => write!(f, "TCPIP0::{host}::{port}::SOCKET"),
            ResourceAddress::Serial { port } => write!(f, "ASRL{port}::INSTR"),
            ResourceAddress::Gpib { board, primary } => write!(f, "GPIB{board}::{primary}::INSTR"),
        }
    }
}

fn invalid(s: &str, why: &str) -> Error {
    Error::InvalidParameter(format!("resource address {s:?}: {why}"))
}

/// Strip a case-insensitive prefix, returning the remainder.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match (s.get(..prefix.len()), s.get(prefix.len()..)) {
        (Some(head), Some(rest)) if head.eq_ignore_ascii_case(prefix) => Some(rest),
        _ => None,
    }
}

/// Parse an optional board number directly following the interface keyword.
fn board_number(s: &str, digits: &str) -> Result<u8> {
    if digits.is_empty() {
        Ok(0)
    } else {
        digits.parse().map_err(|_| invalid(s, "bad board number"))
    }
}

fn parse_socket(s: &str, rest: &str) -> Result<ResourceAddress> {
    let fields: Vec<&str> = rest.split("::").collect();
    board_number(s, fields[0])?;
    let Some(last) = fields.last() else {
        return Err(invalid(s, "missing resource class"));
    };
    if !last.eq_ignore_ascii_case("SOCKET") {
        return Err(Error::Unsupported(format!(
            "{s}: only raw SOCKET resources are supported over TCPIP"
        )));
    }
    match fields.as_slice() {
        [_, host, port, _] if !host.is_empty() => Ok(ResourceAddress::Socket {
            host: host.to_string(),
            port: port.parse().map_err(|_| invalid(s, "bad port"))?,
        }),
        [_, host, _] if !host.is_empty() => Ok(ResourceAddress::Socket {
            host: host.to_string(),
            port: DEFAULT_SCPI_PORT,
        }),
        _ => Err(invalid(s, "expected TCPIP[n]::host[::port]::SOCKET")),
    }
}

fn parse_serial(s: &str, rest: &str) -> Result<ResourceAddress> {
    let port = match rest.rsplit_once("::") {
        Some((port, class)) if class.eq_ignore_ascii_case("INSTR") => port,
        Some(_) => return Err(invalid(s, "expected ASRL<port>::INSTR")),
        None => rest,
    };
    if port.is_empty() {
        return Err(invalid(s, "missing port"));
    }
    // `ASRL3` is COM3 in VISA numbering.
    let port = if port.bytes().all(|b| b.is_ascii_digit()) {
        format!("COM{port}")
    } else {
        port.to_string()
    };
    Ok(ResourceAddress::Serial { port })
}

fn parse_gpib(s: &str, rest: &str) -> Result<ResourceAddress> {
    let fields: Vec<&str> = rest.split("::").collect();
    match fields.as_slice() {
        [board, primary, ..] => Ok(ResourceAddress::Gpib {
            board: board_number(s, board)?,
            primary: primary
                .parse()
                .map_err(|_| invalid(s, "bad primary address"))?,
        }),
        _ => Err(invalid(s, "expected GPIB[n]::address::INSTR")),
    }
}

impl FromStr for ResourceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = strip_prefix_ci(s, "TCPIP") {
            parse_socket(s, rest)
        } else if let Some(rest) = strip_prefix_ci(s, "ASRL") {
            parse_serial(s, rest)
        } else if let Some(rest) = strip_prefix_ci(s, "GPIB") {
            parse_gpib(s, rest)
        } else if let Some((host, port)) = s.rsplit_once(':') {
            if host.is_empty() {
                return Err(invalid(s, "missing host"));
            }
            Ok(ResourceAddress::Socket {
                host: host.to_string(),
                port: port.parse().map_err(|_| invalid(s, "bad port"))?,
            })
        } else {
            Err(invalid(s, "unknown interface type"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(host: &str, port: u16) -> ResourceAddress {
        ResourceAddress::Socket {
            host: host.into(),
            port,
        }
    }

    #[test]
    fn parse_full_socket_address() {
        assert_eq!(
            "TCPIP0::192.168.1.20::5025::SOCKET".parse::<ResourceAddress>().unwrap(),
            socket("192.168.1.20", 5025)
        );
        assert_eq!(
            "tcpip1::fsup.lab::5555::socket".parse::<ResourceAddress>().unwrap(),
            socket("fsup.lab", 5555)
        );
    }

    #[test]
    fn socket_port_defaults_to_5025() {
        assert_eq!(
            "TCPIP::pxa.lab::SOCKET".parse::<ResourceAddress>().unwrap(),
            socket("pxa.lab", 5025)
        );
    }

    #[test]
    fn bare_host_port() {
        assert_eq!(
            "localhost:5025".parse::<ResourceAddress>().unwrap(),
            socket("localhost", 5025)
        );
    }

    #[test]
    fn vxi11_instr_is_unsupported() {
        let err = "TCPIP0::192.168.1.20::inst0::INSTR"
            .parse::<ResourceAddress>()
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn bad_port_is_invalid() {
        let err = "TCPIP0::host::http::SOCKET"
            .parse::<ResourceAddress>()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn parse_serial_addresses() {
        assert_eq!(
            "ASRL/dev/ttyUSB0::INSTR".parse::<ResourceAddress>().unwrap(),
            ResourceAddress::Serial {
                port: "/dev/ttyUSB0".into()
            }
        );
        assert_eq!(
            "ASRL3::INSTR".parse::<ResourceAddress>().unwrap(),
            ResourceAddress::Serial {
                port: "COM3".into()
            }
        );
        assert!("ASRL::INSTR".parse::<ResourceAddress>().is_err());
    }

    #[test]
    fn parse_gpib() {
        assert_eq!(
            "GPIB0::20::INSTR".parse::<ResourceAddress>().unwrap(),
            ResourceAddress::Gpib {
                board: 0,
                primary: 20
            }
        );
    }

    #[test]
    fn unknown_interface() {
        assert!(matches!(
            "USB0::0x2A8D::INSTR".parse::<ResourceAddress>(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        for text in ["TCPIP0::10.0.0.5::5025::SOCKET", "ASRLCOM1::INSTR", "GPIB1::7::INSTR"] {
            let addr: ResourceAddress = text.parse().unwrap();
            assert_eq!(addr.to_string(), text);
        }
    }

    #[tokio::test]
    async fn gpib_open_is_unsupported() {
        let addr: ResourceAddress = "GPIB0::20::INSTR".parse().unwrap();
        let result = addr.open(&OpenOptions::default()).await;
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}
