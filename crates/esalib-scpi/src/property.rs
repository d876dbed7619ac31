//! Declarative instrument properties.
//!
//! A [`Property`] binds a query template, a setting template, a validator
//! and the legal values of one instrument setting. Drivers declare their
//! dialect as `const` tables of properties; reading or writing a setting is
//! then a call to [`Property::get`] or [`Property::set`] with the
//! instrument the driver owns.
//!
//! ```
//! use esalib_scpi::property::Property;
//! use esalib_scpi::validators::{LegalValues, strict_range};
//!
//! const START_FREQUENCY: Property<f64> = Property {
//!     name: "start_frequency",
//!     get_command: Some("FREQ:STAR?"),
//!     set_command: Some("FREQ:STAR %f"),
//!     validator: strict_range,
//!     values: LegalValues::Range { min: 0.0, max: 50e9 },
//!     set_wait: true,
//! };
//!
//! assert_eq!(START_FREQUENCY.set_command_for(1e6).unwrap(), "FREQ:STAR 1000000.000000");
//! assert!(START_FREQUENCY.set_command_for(60e9).is_err());
//! ```

use tracing::debug;

use esalib_core::error::{Error, Result};

use crate::instrument::ScpiInstrument;
use crate::protocol::{self, ScpiValue};
use crate::validators::{LegalValues, Validator};

/// A named instrument setting with its query and setting templates.
#[derive(Debug, Clone, Copy)]
pub struct Property<T: 'static> {
    /// Attribute name used for by-name access (e.g. `"start_frequency"`).
    pub name: &'static str,
    /// Query command, or `None` for write-only settings.
    pub get_command: Option<&'static str>,
    /// Setting command template with one placeholder, or `None` for
    /// read-only settings.
    pub set_command: Option<&'static str>,
    /// Applied to the value before it is formatted into `set_command`.
    pub validator: Validator<T>,
    /// Legal values handed to the validator.
    pub values: LegalValues<T>,
    /// Perform the completion-wait handshake after every write.
    pub set_wait: bool,
}

impl<T: ScpiValue> Property<T> {
    /// Whether the property can be read.
    pub fn is_readable(&self) -> bool {
        self.get_command.is_some()
    }

    /// Whether the property can be written.
    pub fn is_writable(&self) -> bool {
        self.set_command.is_some()
    }

    /// Run the validator on `value`.
    pub fn validate(&self, value: T) -> Result<T> {
        (self.validator)(value, &self.values)
            .map_err(|e| match e {
                Error::Validation(msg) => Error::Validation(format!("{}: {msg}", self.name)),
                other => other,
            })
    }

    /// Validate `value` and format the setting command, without sending it.
    pub fn set_command_for(&self, value: T) -> Result<String> {
        self.prepare(value).map(|(command, _)| command)
    }

    fn prepare(&self, value: T) -> Result<(String, T)> {
        let template = self
            .set_command
            .ok_or_else(|| Error::Unsupported(format!("{} is read-only", self.name)))?;
        let value = self.validate(value)?;
        Ok((protocol::format_command(template, &value)?, value))
    }

    /// Query the instrument and parse the reply.
    pub async fn get(&self, instrument: &ScpiInstrument) -> Result<T> {
        let command = self
            .get_command
            .ok_or_else(|| Error::Unsupported(format!("{} is write-only", self.name)))?;
        let reply = instrument.ask(command).await?;
        let value = T::from_scpi(&reply)?;
        debug!(property = self.name, ?value, "property read");
        Ok(value)
    }

    /// Validate, format and write `value`, then wait for completion if
    /// the property asks for it.
    ///
    /// Returns the value that was sent, which differs from `value` when the
    /// validator clamps it. Nothing is sent if validation fails.
    pub async fn set(&self, instrument: &ScpiInstrument, value: T) -> Result<T> {
        let (command, sent) = self.prepare(value)?;
        instrument.write(&command).await?;
        if self.set_wait {
            instrument.wait_to_complete().await?;
        }
        debug!(property = self.name, requested = ?value, ?sent, "property written");
        Ok(sent)
    }
}

/// A property of any numeric type, for by-name access through `f64`.
#[derive(Debug, Clone, Copy)]
pub enum NumericProperty {
    Real(Property<f64>),
    Integer(Property<u32>),
}

impl NumericProperty {
    /// Attribute name of the wrapped property.
    pub fn name(&self) -> &'static str {
        match self {
            NumericProperty::Real(p) => p.name,
            NumericProperty::Integer(p) => p.name,
        }
    }

    /// Read the property and widen it to `f64`.
    pub async fn get(&self, instrument: &ScpiInstrument) -> Result<f64> {
        match self {
            NumericProperty::Real(p) => p.get(instrument).await,
            NumericProperty::Integer(p) => Ok(p.get(instrument).await?.to_f64()),
        }
    }

    /// Narrow `value` to the property's type and write it. Returns the
    /// value sent, widened back to `f64`.
    pub async fn set(&self, instrument: &ScpiInstrument, value: f64) -> Result<f64> {
        match self {
            NumericProperty::Real(p) => p.set(instrument, value).await,
            NumericProperty::Integer(p) => {
                Ok(p.set(instrument, u32::from_f64(value)?).await?.to_f64())
            }
        }
    }
}

/// Look up a property by attribute name.
///
/// Unknown names are an [`Error::InvalidParameter`].
pub fn lookup<'a>(table: &'a [NumericProperty], name: &str) -> Result<&'a NumericProperty> {
    table
        .iter()
        .find(|p| p.name() == name)
        .ok_or_else(|| Error::InvalidParameter(format!("unknown property {name:?}")))
}
