//! esalib-scpi: The SCPI layer shared by all esalib analyzer drivers.
//!
//! - [`protocol`]: line framing, command templates and reply parsing.
//! - [`validators`]: value checks applied before a setting is written.
//! - [`property`]: declarative query/setting pairs with validation.
//! - [`instrument`]: [`ScpiInstrument`], the connected command channel.
//!
//! Model drivers (`esalib-rohde`, `esalib-keysight`) declare their dialect
//! as tables of [`Property`] values and delegate all I/O to a
//! [`ScpiInstrument`].

pub mod instrument;
pub mod property;
pub mod protocol;
pub mod validators;

pub use instrument::{DEFAULT_COMMAND_TIMEOUT, InstrumentStatus, ScpiInstrument};
pub use property::{NumericProperty, Property};
pub use protocol::{DecodeResult, ScpiValue};
pub use validators::{
    LegalValues, Validator, no_validation, strict_discrete_set, strict_range, truncated_range,
};
