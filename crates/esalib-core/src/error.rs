//! Error types for esalib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Validation, communication, reply
//! parsing and driver construction failures are all captured here.

/// The error type for all esalib operations.
///
/// Variants fall into four groups: value validation (raised before any
/// command reaches the instrument), communication (transport failures and
/// timeouts), reply parsing, and driver selection/construction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value lies outside the legal values declared for a property.
    ///
    /// Raised before any command is sent to the instrument.
    #[error("validation error: {0}")]
    Validation(String),

    /// A transport-level error (TCP socket, serial port, bus adapter).
    #[error("transport error: {0}")]
    Transport(String),

    /// Timed out waiting for a response from the instrument.
    ///
    /// This typically indicates the instrument is powered off, the
    /// address is wrong, or a write-only command was sent as a query.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the instrument has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the instrument was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// The instrument replied with text that does not have the expected
    /// shape (malformed identity string, non-numeric reply to a numeric
    /// query).
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested operation is not supported by this analyzer model.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a command builder or constructor.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The configured `devicedriver` does not name a known driver.
    #[error("unsupported device driver: {0}")]
    UnsupportedDriver(String),

    /// The selected driver could not be constructed.
    #[error("failed to initialize driver {driver}: {source}")]
    DriverInitialization {
        /// Driver name from the configuration.
        driver: String,
        /// The error raised while building the driver.
        #[source]
        source: Box<Error>,
    },

    /// The facade configuration could not be read.
    #[error("configuration error: {0}")]
    Config(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for errors raised by the transport layer: write or
    /// read failures, timeouts and lost connections.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
