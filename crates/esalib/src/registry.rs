//! Driver registry: maps a `devicedriver` name to the driver that serves it.

use std::time::Duration;

use esalib_core::error::{Error, Result};
use esalib_core::transport::Transport;
use esalib_core::types::{AnalyzerDefinition, Manufacturer};
use esalib_core::SpectrumAnalyzer;

/// Returns every analyzer definition served by the enabled backends.
///
/// ```
/// for def in esalib::supported_drivers() {
///     println!("{} {} ({})", def.manufacturer, def.model_name, def.driver_name);
/// }
/// ```
pub fn supported_drivers() -> Vec<AnalyzerDefinition> {
    let mut drivers = Vec::new();

    #[cfg(feature = "rohde")]
    drivers.extend(esalib_rohde::models::all_models());

    #[cfg(feature = "keysight")]
    drivers.extend(esalib_keysight::models::all_models());

    drivers
}

/// Look up a driver by name, ignoring ASCII case.
pub fn find_driver(name: &str) -> Result<AnalyzerDefinition> {
    let name = name.trim();
    supported_drivers()
        .into_iter()
        .find(|def| def.driver_name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnsupportedDriver(name.to_string()))
}

/// Build the driver for `definition` on top of an open transport.
pub(crate) async fn build_driver(
    definition: AnalyzerDefinition,
    transport: Box<dyn Transport>,
    timeout: Option<Duration>,
) -> Result<Box<dyn SpectrumAnalyzer>> {
    match definition.manufacturer {
        #[cfg(feature = "rohde")]
        Manufacturer::RohdeSchwarz => {
            let mut builder = esalib_rohde::RohdeBuilder::new(definition);
            if let Some(timeout) = timeout {
                builder = builder.command_timeout(timeout);
            }
            Ok(Box::new(builder.build_with_transport(transport).await?))
        }
        #[cfg(feature = "keysight")]
        Manufacturer::Keysight => {
            let mut builder = esalib_keysight::KeysightBuilder::new(definition);
            if let Some(timeout) = timeout {
                builder = builder.command_timeout(timeout);
            }
            Ok(Box::new(builder.build_with_transport(transport).await?))
        }
        #[allow(unreachable_patterns)]
        other => Err(Error::UnsupportedDriver(format!(
            "{} ({other} backend not enabled)",
            definition.driver_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_models_registered() {
        let names: Vec<_> = supported_drivers().iter().map(|d| d.driver_name).collect();
        assert!(names.contains(&"FSUP50"));
        assert!(names.contains(&"N9030A"));
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_driver("fsup50").unwrap().driver_name, "FSUP50");
        assert_eq!(
            find_driver(" n9030a ").unwrap().manufacturer,
            Manufacturer::Keysight
        );
    }

    #[test]
    fn unknown_driver() {
        match find_driver("HP8565E") {
            Err(Error::UnsupportedDriver(name)) => assert_eq!(name, "HP8565E"),
            other => panic!("expected UnsupportedDriver, got {other:?}"),
        }
    }
}
