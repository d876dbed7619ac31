//! Rohde & Schwarz model definitions.
//!
//! | Model  | Driver name | Frequency range | Markers | Traces |
//! |--------|-------------|-----------------|---------|--------|
//! | FSUP50 | `FSUP50`    | 20 Hz - 50 GHz  | 1 (implicit) | 3 |

use esalib_core::{AnalyzerDefinition, Manufacturer};

/// `devicedriver` value selecting the FSUP50 driver.
pub const FSUP50_DRIVER: &str = "FSUP50";

/// R&S FSUP50 signal source analyzer.
pub fn fsup50() -> AnalyzerDefinition {
    AnalyzerDefinition {
        manufacturer: Manufacturer::RohdeSchwarz,
        model_name: "FSUP50",
        driver_name: FSUP50_DRIVER,
        max_frequency_hz: 50e9,
    }
}

/// All models this crate drives.
pub fn all_models() -> Vec<AnalyzerDefinition> {
    vec![fsup50()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsup50_definition() {
        let def = fsup50();
        assert_eq!(def.manufacturer, Manufacturer::RohdeSchwarz);
        assert_eq!(def.driver_name, "FSUP50");
        assert_eq!(def.max_frequency_hz, 50e9);
        assert_eq!(all_models(), vec![def]);
    }
}
