//! FSU-family SCPI dialect.
//!
//! Settings are declared as `const` [`Property`] descriptors so they can be
//! shared by every [`RohdeAnalyzer`](crate::RohdeAnalyzer) instance;
//! one-shot program messages are plain string constants. Nothing here
//! performs I/O.

use esalib_core::error::{Error, Result};
use esalib_scpi::protocol;
use esalib_scpi::{
    LegalValues, NumericProperty, Property, no_validation, strict_discrete_set, strict_range,
};

// ---------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------

/// Start frequency, 0 Hz to 50 GHz.
pub const START_FREQUENCY: Property<f64> = Property {
    name: "start_frequency",
    get_command: Some("FREQ:STAR?"),
    set_command: Some("FREQ:STAR %f"),
    validator: strict_range,
    values: LegalValues::Range { min: 0.0, max: 50e9 },
    set_wait: true,
};

/// Stop frequency. The instrument clamps it itself, so no range is
/// declared.
pub const STOP_FREQUENCY: Property<f64> = Property {
    name: "stop_frequency",
    get_command: Some("FREQ:STOP?"),
    set_command: Some("FREQ:STOP %f"),
    validator: strict_range,
    values: LegalValues::Any,
    set_wait: true,
};

pub const CENTER_FREQUENCY: Property<f64> = Property {
    name: "center_frequency",
    get_command: None,
    set_command: Some("FREQ:CENT %f"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

pub const SPAN_FREQUENCY: Property<f64> = Property {
    name: "span_frequency",
    get_command: None,
    set_command: Some("FREQ:SPAN %f"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

// ---------------------------------------------------------------
// Bandwidth
// ---------------------------------------------------------------

/// Video bandwidth, 1 Hz to 10 MHz in 1-2-3-5 steps.
pub const VIDEO_BW: Property<f64> = Property {
    name: "video_bw",
    get_command: Some("BAND:VID?"),
    set_command: Some("BAND:VID %fHz"),
    validator: strict_range,
    values: LegalValues::Range { min: 1.0, max: 10e6 },
    set_wait: true,
};

/// Resolution bandwidth, 10 Hz to 20 MHz in 1-2-3-5 steps plus 50 MHz.
///
/// Writing a value switches RBW coupling off on the instrument.
pub const RESOLUTION_BW: Property<f64> = Property {
    name: "resolution_bw",
    get_command: Some("BAND?"),
    set_command: Some("BAND %fHz"),
    validator: strict_range,
    values: LegalValues::Range { min: 10.0, max: 50e6 },
    set_wait: true,
};

pub const RESOLUTION_BW_AUTO_ON: &str = "BAND:AUTO ON";
pub const RESOLUTION_BW_AUTO_OFF: &str = "BAND:AUTO OFF";

// ---------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------

/// Sweep point counts the FSU firmware accepts.
pub const SWEEP_POINT_CHOICES: &[u32] = &[125, 201, 251, 401, 501, 801, 1001, 1601, 2001, 4001, 8001];

pub const SWEEP_POINTS: Property<u32> = Property {
    name: "sweep_points",
    get_command: Some("SWE:POIN?"),
    set_command: Some("SWE:POIN %d"),
    validator: strict_discrete_set,
    values: LegalValues::Set(SWEEP_POINT_CHOICES),
    set_wait: false,
};

/// Sweep time in seconds (read-only here; the FSUP couples it to span
/// and bandwidth).
pub const SWEEP_TIME: Property<f64> = Property {
    name: "sweep_time",
    get_command: Some("SWE:TIME?"),
    set_command: None,
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

pub const SWEEP_SINGLE: &str = "INIT:CONT OFF";
pub const SWEEP_CONTINUOUS: &str = "INIT:CONT ON";

// ---------------------------------------------------------------
// Marker
// ---------------------------------------------------------------

pub const MARKER_FREQUENCY: Property<f64> = Property {
    name: "marker_frequency",
    get_command: Some("CALC:MARK:X?"),
    set_command: None,
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

pub const MARKER_AMPLITUDE: Property<f64> = Property {
    name: "marker_amplitude",
    get_command: Some("CALC:MARK:Y?"),
    set_command: None,
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

/// Peak search on the (single) marker.
pub const MARKER_PEAK: &str = "CALC:MARK:MAX";

// ---------------------------------------------------------------
// Traces
// ---------------------------------------------------------------

/// Number of traces the FSUP displays.
pub const TRACE_COUNT: u8 = 3;

/// Build the ASCII trace readout query (`TRAC? TRACE<n>`).
pub fn cmd_read_trace(trace: u8) -> Result<String> {
    if !(1..=TRACE_COUNT).contains(&trace) {
        return Err(Error::InvalidParameter(format!(
            "trace {trace} out of range 1..={TRACE_COUNT}"
        )));
    }
    Ok(format!("TRAC? TRACE{trace}"))
}

/// Parse an ASCII trace reply into amplitude values.
pub fn parse_trace(reply: &str) -> Result<Vec<f64>> {
    protocol::parse_real_list(reply)
}

/// Properties reachable by attribute name.
pub const NUMERIC_PROPERTIES: &[NumericProperty] = &[
    NumericProperty::Real(START_FREQUENCY),
    NumericProperty::Real(STOP_FREQUENCY),
    NumericProperty::Real(CENTER_FREQUENCY),
    NumericProperty::Real(SPAN_FREQUENCY),
    NumericProperty::Real(VIDEO_BW),
    NumericProperty::Real(RESOLUTION_BW),
    NumericProperty::Integer(SWEEP_POINTS),
    NumericProperty::Real(SWEEP_TIME),
    NumericProperty::Real(MARKER_FREQUENCY),
    NumericProperty::Real(MARKER_AMPLITUDE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_frequency_bounds() {
        assert_eq!(
            START_FREQUENCY.set_command_for(0.0).unwrap(),
            "FREQ:STAR 0.000000"
        );
        assert_eq!(
            START_FREQUENCY.set_command_for(50e9).unwrap(),
            "FREQ:STAR 50000000000.000000"
        );
        assert!(matches!(
            START_FREQUENCY.set_command_for(50.000001e9),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn stop_frequency_unconstrained() {
        assert_eq!(
            STOP_FREQUENCY.set_command_for(67e9).unwrap(),
            "FREQ:STOP 67000000000.000000"
        );
    }

    #[test]
    fn bandwidths_carry_hz_suffix() {
        assert_eq!(VIDEO_BW.set_command_for(300.0).unwrap(), "BAND:VID 300.000000Hz");
        assert_eq!(
            RESOLUTION_BW.set_command_for(1e3).unwrap(),
            "BAND 1000.000000Hz"
        );
        assert!(VIDEO_BW.set_command_for(0.5).is_err());
        assert!(RESOLUTION_BW.set_command_for(5.0).is_err());
        assert!(RESOLUTION_BW.set_command_for(60e6).is_err());
    }

    #[test]
    fn sweep_points_discrete() {
        assert!(SWEEP_POINTS.set_command_for(625).is_err());
        assert_eq!(SWEEP_POINTS.set_command_for(8001).unwrap(), "SWE:POIN 8001");
    }

    #[test]
    fn read_only_markers() {
        assert!(!MARKER_FREQUENCY.is_writable());
        assert_eq!(MARKER_FREQUENCY.get_command, Some("CALC:MARK:X?"));
        assert!(!CENTER_FREQUENCY.is_readable());
    }

    #[test]
    fn trace_query() {
        assert_eq!(cmd_read_trace(1).unwrap(), "TRAC? TRACE1");
        assert!(matches!(cmd_read_trace(0), Err(Error::InvalidParameter(_))));
        assert!(cmd_read_trace(4).is_err());
    }

    #[test]
    fn property_names_unique() {
        let mut names: Vec<_> = NUMERIC_PROPERTIES.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NUMERIC_PROPERTIES.len());
    }
}
