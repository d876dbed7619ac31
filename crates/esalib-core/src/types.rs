//! Core types used throughout esalib.
//!
//! These types provide a model-agnostic layer over the SCPI dialects
//! spoken by the individual analyzer families.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Analyzer manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    /// Rohde & Schwarz (FSU, FSUP, FSV families).
    RohdeSchwarz,
    /// Keysight, formerly Agilent (PXA, MXA, EXA X-Series).
    Keysight,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Manufacturer::RohdeSchwarz => write!(f, "Rohde & Schwarz"),
            Manufacturer::Keysight => write!(f, "Keysight"),
        }
    }
}

/// Error returned when parsing an unknown manufacturer name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseManufacturerError(String);

impl fmt::Display for ParseManufacturerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown manufacturer: {}", self.0)
    }
}

impl std::error::Error for ParseManufacturerError {}

impl FromStr for Manufacturer {
    type Err = ParseManufacturerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rohde" | "rs" | "r&s" | "rohde-schwarz" | "rohde & schwarz" => {
                Ok(Manufacturer::RohdeSchwarz)
            }
            "keysight" | "agilent" => Ok(Manufacturer::Keysight),
            _ => Err(ParseManufacturerError(s.to_string())),
        }
    }
}

/// The identity of a connected instrument, parsed from its `*IDN?` reply.
///
/// IEEE 488.2 defines the reply as four comma-separated fields:
/// manufacturer, model, serial number and firmware revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Manufacturer field (e.g. "Rohde&Schwarz").
    pub vendor: String,
    /// Model field (e.g. "FSUP-50").
    pub model: String,
    /// Serial number field.
    pub serial: String,
    /// Firmware revision field.
    pub firmware: String,
}

impl FromStr for Identity {
    type Err = Error;

    /// Parse an identity reply such as `"Vendor,Model,SN123,1.02"`.
    ///
    /// Leading and trailing whitespace around each field is removed.
    /// Replies with fewer than four fields are rejected; fields beyond the
    /// fourth are ignored.
    fn from_str(reply: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = reply.trim().split(',').map(str::trim).collect();
        if fields.len() < 4 {
            return Err(Error::Parse(format!(
                "identity reply {reply:?} has {} field(s), expected 4",
                fields.len()
            )));
        }
        Ok(Identity {
            vendor: fields[0].to_string(),
            model: fields[1].to_string(),
            serial: fields[2].to_string(),
            firmware: fields[3].to_string(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, serial={}, FW={}",
            self.vendor, self.model, self.serial, self.firmware
        )
    }
}

/// Static description of a supported analyzer model.
///
/// Obtained via `esalib::supported_drivers()` (facade crate) or by
/// converting a manufacturer-specific model type via its `From`
/// implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerDefinition {
    /// The manufacturer of the analyzer.
    pub manufacturer: Manufacturer,
    /// Human-readable model name (e.g. "FSUP50").
    pub model_name: &'static str,
    /// Name used by the `devicedriver` configuration key.
    pub driver_name: &'static str,
    /// Upper end of the frequency range in hertz.
    pub max_frequency_hz: f64,
}

/// Information about a connected analyzer.
///
/// Returned by [`crate::analyzer::SpectrumAnalyzer::info()`].
#[derive(Debug, Clone)]
pub struct AnalyzerInfo {
    /// The manufacturer of the analyzer.
    pub manufacturer: Manufacturer,
    /// Name of the driver controlling the instrument.
    pub driver_name: String,
    /// Identity reported by the instrument itself.
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_parses_four_fields() {
        let id: Identity = "Vendor,Model,SN123,1.02".parse().unwrap();
        assert_eq!(id.vendor, "Vendor");
        assert_eq!(id.model, "Model");
        assert_eq!(id.serial, "SN123");
        assert_eq!(id.firmware, "1.02");
    }

    #[test]
    fn identity_trims_fields_and_line_end() {
        let id: Identity = "Rohde&Schwarz, FSUP-50 ,100123/050, 4.71 SP1\r\n"
            .parse()
            .unwrap();
        assert_eq!(id.vendor, "Rohde&Schwarz");
        assert_eq!(id.model, "FSUP-50");
        assert_eq!(id.serial, "100123/050");
        assert_eq!(id.firmware, "4.71 SP1");
    }

    #[test]
    fn identity_ignores_extra_fields() {
        let id: Identity = "Keysight Technologies,N9030A,MY5432,A.14.16,extra"
            .parse()
            .unwrap();
        assert_eq!(id.firmware, "A.14.16");
    }

    #[test]
    fn identity_with_two_fields_is_parse_error() {
        let result: std::result::Result<Identity, Error> = "Vendor,Model".parse();
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn identity_display() {
        let id: Identity = "Vendor,Model,SN123,1.02".parse().unwrap();
        assert_eq!(id.to_string(), "Vendor Model, serial=SN123, FW=1.02");
    }

    #[test]
    fn manufacturer_from_str() {
        assert_eq!(
            "R&S".parse::<Manufacturer>().unwrap(),
            Manufacturer::RohdeSchwarz
        );
        assert_eq!(
            "agilent".parse::<Manufacturer>().unwrap(),
            Manufacturer::Keysight
        );
        assert!("Anritsu".parse::<Manufacturer>().is_err());
    }

    #[test]
    fn manufacturer_display() {
        assert_eq!(Manufacturer::RohdeSchwarz.to_string(), "Rohde & Schwarz");
        assert_eq!(Manufacturer::Keysight.to_string(), "Keysight");
    }
}
