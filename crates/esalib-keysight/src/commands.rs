//! X-Series SCPI dialect.
//!
//! Settings without a marker argument are `const` [`Property`]
//! descriptors. Marker-indexed commands embed the marker number in the
//! header, so they are produced by `cmd_*` builders that check the index
//! against [`MARKER_COUNT`] first. Nothing here performs I/O.

use esalib_core::error::{Error, Result};
use esalib_scpi::protocol::{self, ScpiValue};
use esalib_scpi::{
    LegalValues, NumericProperty, Property, no_validation, strict_range, truncated_range,
};

// ---------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------

pub const START_FREQUENCY: Property<f64> = Property {
    name: "start_frequency",
    get_command: Some("SENS:FREQ:STAR?"),
    set_command: Some("SENS:FREQ:STAR %f"),
    validator: strict_range,
    values: LegalValues::Range { min: 0.0, max: 50e9 },
    set_wait: true,
};

pub const STOP_FREQUENCY: Property<f64> = Property {
    name: "stop_frequency",
    get_command: Some("SENS:FREQ:STOP?"),
    set_command: Some("SENS:FREQ:STOP %f"),
    validator: strict_range,
    values: LegalValues::Range { min: 0.0, max: 50e9 },
    set_wait: true,
};

pub const CENTER_FREQUENCY: Property<f64> = Property {
    name: "center_frequency",
    get_command: Some("SENS:FREQ:CENT?"),
    set_command: Some("SENS:FREQ:CENT %f"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

pub const SPAN_FREQUENCY: Property<f64> = Property {
    name: "span_frequency",
    get_command: Some("SENS:FREQ:SPAN?"),
    set_command: Some("SENS:FREQ:SPAN %f"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

// ---------------------------------------------------------------
// Bandwidth
// ---------------------------------------------------------------

/// Video bandwidth, 1 Hz to 3 MHz plus the 50 MHz "wide open" setting.
pub const VIDEO_BW: Property<f64> = Property {
    name: "video_bw",
    get_command: Some("SENS:BAND:VID?"),
    set_command: Some("SENS:BAND:VID %f"),
    validator: strict_range,
    values: LegalValues::Range { min: 1.0, max: 50e6 },
    set_wait: true,
};

/// Resolution bandwidth, 1 Hz to 8 MHz.
pub const RESOLUTION_BW: Property<f64> = Property {
    name: "resolution_bw",
    get_command: Some("SENS:BAND:RES?"),
    set_command: Some("SENS:BAND:RES %f"),
    validator: strict_range,
    values: LegalValues::Range { min: 1.0, max: 8e6 },
    set_wait: true,
};

pub const RESOLUTION_BW_AUTO: Property<bool> = Property {
    name: "resolution_bw_auto",
    get_command: Some("SENS:BAND:RES:AUTO?"),
    set_command: Some("SENS:BAND:RES:AUTO %s"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

// ---------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------

/// Sweep points, clamped to 1..=40001 like the front panel does.
pub const SWEEP_POINTS: Property<u32> = Property {
    name: "sweep_points",
    get_command: Some("SENS:SWE:POIN?"),
    set_command: Some("SENS:SWE:POIN %d"),
    validator: truncated_range,
    values: LegalValues::Range { min: 1, max: 40001 },
    set_wait: false,
};

pub const SWEEP_TIME: Property<f64> = Property {
    name: "sweep_time",
    get_command: Some("SENS:SWE:TIME?"),
    set_command: None,
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

pub const SWEEP_SINGLE: &str = "INIT:CONT OFF";
pub const SWEEP_CONTINUOUS: &str = "INIT:CONT ON";

// ---------------------------------------------------------------
// Instrument application and corrections
// ---------------------------------------------------------------

/// Catalog of installed measurement applications.
pub const INSTRUMENT_CATALOG: &str = "INST:CAT?";

/// Noise floor extension.
pub const NOISE_FLOOR_EXTENSION: Property<bool> = Property {
    name: "noise_floor_extension",
    get_command: Some("SENS:CORR:NOIS:FLO?"),
    set_command: Some("SENS:CORR:NOIS:FLO %s"),
    validator: no_validation,
    values: LegalValues::Any,
    set_wait: false,
};

/// Build the application select command (`INST:SEL <name>`).
///
/// Application names are SCPI mnemonics such as `SA`, `PNOISE`, `NFIGURE`.
pub fn cmd_instrument_select(application: &str) -> Result<String> {
    let application = application.trim();
    if application.is_empty() || !application.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::InvalidParameter(format!(
            "invalid application name {application:?}"
        )));
    }
    Ok(format!("INST:SEL {application}"))
}

/// Strip the string-response quotes from an `INST:CAT?` reply.
pub fn parse_catalog(reply: &str) -> String {
    reply.trim().trim_matches('"').to_string()
}

// ---------------------------------------------------------------
// Markers
// ---------------------------------------------------------------

/// Number of markers on X-Series analyzers.
pub const MARKER_COUNT: u8 = 12;

fn check_marker(marker: u8) -> Result<u8> {
    if (1..=MARKER_COUNT).contains(&marker) {
        Ok(marker)
    } else {
        Err(Error::InvalidParameter(format!(
            "marker {marker} out of range 1..={MARKER_COUNT}"
        )))
    }
}

/// Marker X value query (`CALC:MARK<n>:X?`).
pub fn cmd_marker_x(marker: u8) -> Result<String> {
    Ok(format!("CALC:MARK{}:X?", check_marker(marker)?))
}

/// Marker Y value query (`CALC:MARK<n>:Y?`).
pub fn cmd_marker_y(marker: u8) -> Result<String> {
    Ok(format!("CALC:MARK{}:Y?", check_marker(marker)?))
}

/// Peak search (`CALC:MARK<n>:MAX`).
pub fn cmd_marker_peak(marker: u8) -> Result<String> {
    Ok(format!("CALC:MARK{}:MAX", check_marker(marker)?))
}

/// Band power function on or off (`CALC:MARK<n>:FUNC BPOW|OFF`).
pub fn cmd_marker_bandpower(marker: u8, on: bool) -> Result<String> {
    let function = if on { "BPOW" } else { "OFF" };
    Ok(format!("CALC:MARK{}:FUNC {function}", check_marker(marker)?))
}

/// Edge of a marker's band function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandEdge {
    Left,
    Right,
}

impl BandEdge {
    fn mnemonic(self) -> &'static str {
        match self {
            BandEdge::Left => "LEFT",
            BandEdge::Right => "RIGHT",
        }
    }
}

/// Band edge query (`CALC:MARK<n>:FUNC:BAND:LEFT?`).
pub fn cmd_marker_band_edge_query(marker: u8, edge: BandEdge) -> Result<String> {
    Ok(format!(
        "CALC:MARK{}:FUNC:BAND:{}?",
        check_marker(marker)?,
        edge.mnemonic()
    ))
}

/// Band edge setting (`CALC:MARK<n>:FUNC:BAND:LEFT <hz>`).
pub fn cmd_marker_band_edge_set(marker: u8, edge: BandEdge, freq_hz: f64) -> Result<String> {
    if !freq_hz.is_finite() || freq_hz < 0.0 {
        return Err(Error::Validation(format!(
            "band edge {freq_hz} must be a non-negative frequency"
        )));
    }
    Ok(format!(
        "CALC:MARK{}:FUNC:BAND:{} {}",
        check_marker(marker)?,
        edge.mnemonic(),
        freq_hz.to_scpi()
    ))
}

// ---------------------------------------------------------------
// Traces
// ---------------------------------------------------------------

pub const TRACE_COUNT: u8 = 6;

/// ASCII trace readout query (`TRAC:DATA? TRACE<n>`).
pub fn cmd_read_trace(trace: u8) -> Result<String> {
    if !(1..=TRACE_COUNT).contains(&trace) {
        return Err(Error::InvalidParameter(format!(
            "trace {trace} out of range 1..={TRACE_COUNT}"
        )));
    }
    Ok(format!("TRAC:DATA? TRACE{trace}"))
}

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
];
