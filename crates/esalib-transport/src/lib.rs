//! Transport implementations for esalib.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](esalib_core::Transport) trait from `esalib-core`:
//!
//! - [`TcpTransport`]: raw SCPI sockets (LAN analyzers, usually port 5025)
//! - [`SerialTransport`]: RS-232 and USB virtual COM ports
//!
//! and [`ResourceAddress`], which parses VISA-style resource strings such
//! as `TCPIP0::192.168.1.20::5025::SOCKET` and opens the matching
//! transport.
//!
//! # Example
//!
//! ```no_run
//! use esalib_transport::ResourceAddress;
//! use esalib_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> esalib_core::Result<()> {
//! let address: ResourceAddress = "TCPIP0::192.168.1.20::5025::SOCKET".parse()?;
//! let mut transport = address.open(&Default::default()).await?;
//!
//! transport.send(b"*IDN?\n").await?;
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod serial;
pub mod tcp;

pub use address::{OpenOptions, ResourceAddress};
pub use serial::{SerialConfig, SerialTransport};
pub use tcp::TcpTransport;
