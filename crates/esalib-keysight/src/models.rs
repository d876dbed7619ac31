//! Keysight model definitions.
//!
//! The N9030A PXA is offered with frequency options up to 50 GHz
//! (option 550); the definition assumes the top option so no legal setting
//! is rejected on the host side.

use esalib_core::{AnalyzerDefinition, Manufacturer};

/// `devicedriver` value selecting the N9030A driver.
pub const N9030A_DRIVER: &str = "N9030A";

/// Keysight N9030A PXA signal analyzer.
pub fn n9030a() -> AnalyzerDefinition {
    AnalyzerDefinition {
        manufacturer: Manufacturer::Keysight,
        model_name: "N9030A PXA",
        driver_name: N9030A_DRIVER,
        max_frequency_hz: 50e9,
    }
}

/// All models this crate drives.
pub fn all_models() -> Vec<AnalyzerDefinition> {
    vec![n9030a()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n9030a_definition() {
        let def = n9030a();
        assert_eq!(def.manufacturer, Manufacturer::Keysight);
        assert_eq!(def.driver_name, "N9030A");
        assert_eq!(all_models().len(), 1);
    }
}
