//! SCPI line framing, command templates and reply parsing.
//!
//! SCPI program and response messages are newline-terminated ASCII lines.
//! Instruments reached over GPIB or serial adapters often append a carriage
//! return before the newline, which is stripped on decode.
//!
//! Command templates carry a single printf-style placeholder (`%f`, `%d` or
//! `%s`) which is replaced by the value's SCPI rendering, so a dialect can
//! be declared as plain strings such as `"FREQ:STAR %f"`.

use esalib_core::error::{Error, Result};

/// The newline byte that terminates every SCPI message.
pub const TERMINATOR: u8 = b'\n';

/// Result of attempting to decode one response line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete line was decoded.
    Line {
        /// Line content without the terminator and trailing `\r`.
        line: String,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },

    /// The line is complete but not valid UTF-8.
    Invalid(usize),

    /// The buffer does not yet contain a complete line. More data is needed.
    Incomplete,
}

/// Decode one newline-terminated response from a byte buffer.
///
/// Returns the first complete line found, or [`DecodeResult::Incomplete`]
/// if no terminator is present yet.
pub fn decode_line(buf: &[u8]) -> DecodeResult {
    let term_pos = match buf.iter().position(|&b| b == TERMINATOR) {
        Some(pos) => pos,
        None => return DecodeResult::Incomplete,
    };

    let consumed = term_pos + 1;
    let body = buf[..term_pos].strip_suffix(b"\r").unwrap_or(&buf[..term_pos]);

    match std::str::from_utf8(body) {
        Ok(s) => DecodeResult::Line {
            line: s.to_string(),
            consumed,
        },
        Err(_) => DecodeResult::Invalid(consumed),
    }
}

/// Encode a command as a newline-terminated program message.
///
/// Commands that already end in a newline are sent unchanged, so constants
/// such as `"*RST\n"` and `"*RST"` produce the same bytes.
///
/// # Examples
///
/// ```
/// use esalib_scpi::protocol::encode_line;
///
/// assert_eq!(encode_line("*RST"), b"*RST\n");
/// assert_eq!(encode_line("*OPC?\n"), b"*OPC?\n");
/// ```
pub fn encode_line(command: &str) -> Vec<u8> {
    let mut bytes = command.as_bytes().to_vec();
    if bytes.last() != Some(&TERMINATOR) {
        bytes.push(TERMINATOR);
    }
    bytes
}

/// A value that can be written into and read back from SCPI text.
pub trait ScpiValue: Copy + PartialOrd + std::fmt::Debug + Send + Sync + 'static {
    /// Render the value as it appears in a program message.
    fn to_scpi(&self) -> String;

    /// Parse a response message into a value.
    fn from_scpi(reply: &str) -> Result<Self>;

    /// Widen to the `f64` used for by-name property access.
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, rejecting values the type cannot represent.
    fn from_f64(value: f64) -> Result<Self>;
}

impl ScpiValue for f64 {
    /// Fixed-point with six decimals, e.g. `10.000000`.
    fn to_scpi(&self) -> String {
        format!("{self:.6}")
    }

    fn from_scpi(reply: &str) -> Result<Self> {
        let trimmed = reply.trim();
        trimmed
            .parse::<f64>()
            .map_err(|e| Error::Parse(format!("expected a number, got {trimmed:?} ({e})")))
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Result<Self> {
        Ok(value)
    }
}

impl ScpiValue for u32 {
    fn to_scpi(&self) -> String {
        self.to_string()
    }

    /// Accepts integer replies as well as the `+4.01000000E+002` real
    /// notation some instruments use for integer settings.
    fn from_scpi(reply: &str) -> Result<Self> {
        let trimmed = reply.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Ok(n);
        }
        let real = f64::from_scpi(trimmed)?;
        if real < 0.0 || real > u32::MAX as f64 || real.fract() != 0.0 {
            return Err(Error::Parse(format!(
                "expected a non-negative integer, got {trimmed:?}"
            )));
        }
        Ok(real as u32)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Result<Self> {
        if value < 0.0 || value > u32::MAX as f64 || value.fract() != 0.0 {
            return Err(Error::InvalidParameter(format!(
                "{value} is not a non-negative integer"
            )));
        }
        Ok(value as u32)
    }
}

impl ScpiValue for bool {
    fn to_scpi(&self) -> String {
        if *self { "ON".into() } else { "OFF".into() }
    }

    fn from_scpi(reply: &str) -> Result<Self> {
        match reply.trim().to_ascii_uppercase().as_str() {
            "1" | "ON" => Ok(true),
            "0" | "OFF" => Ok(false),
            other => Err(Error::Parse(format!("expected a boolean, got {other:?}"))),
        }
    }

    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    fn from_f64(value: f64) -> Result<Self> {
        if value == 0.0 {
            Ok(false)
        } else if value == 1.0 {
            Ok(true)
        } else {
            Err(Error::InvalidParameter(format!("{value} is not 0 or 1")))
        }
    }
}

/// Substitute `value` into the single placeholder of a command template.
///
/// The first `%f`, `%d` or `%s` is replaced with [`ScpiValue::to_scpi`].
/// Templates without a placeholder are rejected.
///
/// # Examples
///
/// ```
/// use esalib_scpi::protocol::format_command;
///
/// assert_eq!(format_command("FREQ:STAR %f", &10.0).unwrap(), "FREQ:STAR 10.000000");
/// assert_eq!(format_command("BAND:VID %fHz", &300.0).unwrap(), "BAND:VID 300.000000Hz");
/// assert_eq!(format_command("SWE:POIN %d", &401u32).unwrap(), "SWE:POIN 401");
/// ```
pub fn format_command<T: ScpiValue>(template: &str, value: &T) -> Result<String> {
    let pos = template
        .match_indices('%')
        .map(|(i, _)| i)
        .find(|&i| matches!(template.as_bytes().get(i + 1), Some(b'f' | b'd' | b's')))
        .ok_or_else(|| {
            Error::InvalidParameter(format!("command template {template:?} has no placeholder"))
        })?;

    let mut command = String::with_capacity(template.len() + 16);
    command.push_str(&template[..pos]);
    command.push_str(&value.to_scpi());
    command.push_str(&template[pos + 2..]);
    Ok(command)
}

/// Interpret the reply to `*OPC?`.
///
/// The instrument answers `1` once all pending operations are complete,
/// which maps to completion code `0`. Any other integer maps to `1`.
pub fn completion_code(reply: &str) -> Result<u32> {
    let trimmed = reply.trim();
    let value: i64 = trimmed
        .trim_start_matches('+')
        .parse()
        .map_err(|e| Error::Parse(format!("invalid *OPC? reply {trimmed:?} ({e})")))?;
    Ok(if value == 1 { 0 } else { 1 })
}

/// Parse a comma-separated list of real numbers (ASCII trace data).
pub fn parse_real_list(reply: &str) -> Result<Vec<f64>> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed.split(',').map(f64::from_scpi).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // decode_line
    // -----------------------------------------------------------------------

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode_line(b""), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_no_terminator() {
        assert_eq!(decode_line(b"1.0E+009"), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_simple_line() {
        assert_eq!(
            decode_line(b"1000000000\n"),
            DecodeResult::Line {
                line: "1000000000".into(),
                consumed: 11,
            }
        );
    }

    #[test]
    fn decode_strips_carriage_return() {
        assert_eq!(
            decode_line(b"1\r\n"),
            DecodeResult::Line {
                line: "1".into(),
                consumed: 3,
            }
        );
    }

    #[test]
    fn decode_first_of_two_lines() {
        assert_eq!(
            decode_line(b"1\n2\n"),
            DecodeResult::Line {
                line: "1".into(),
                consumed: 2,
            }
        );
    }

    #[test]
    fn decode_non_utf8_is_invalid() {
        assert_eq!(decode_line(&[0xFF, 0xFE, b'\n']), DecodeResult::Invalid(3));
    }

    // -----------------------------------------------------------------------
    // values
    // -----------------------------------------------------------------------

    #[test]
    fn float_parses_scientific_notation() {
        assert_eq!(f64::from_scpi("1.5E+009\n").unwrap(), 1.5e9);
        assert_eq!(f64::from_scpi(" -45.25 ").unwrap(), -45.25);
    }

    #[test]
    fn float_rejects_text() {
        assert!(matches!(f64::from_scpi("ERR"), Err(Error::Parse(_))));
    }

    #[test]
    fn u32_parses_real_notation() {
        assert_eq!(u32::from_scpi("401").unwrap(), 401);
        assert_eq!(u32::from_scpi("+4.01000000E+002").unwrap(), 401);
        assert!(u32::from_scpi("4.5").is_err());
        assert!(u32::from_scpi("-1").is_err());
    }

    #[test]
    fn u32_from_f64_rejects_fractions() {
        assert_eq!(u32::from_f64(401.0).unwrap(), 401);
        assert!(matches!(u32::from_f64(400.5), Err(Error::InvalidParameter(_))));
        assert!(u32::from_f64(-1.0).is_err());
    }

    #[test]
    fn bool_round_trip_text() {
        assert_eq!(true.to_scpi(), "ON");
        assert_eq!(false.to_scpi(), "OFF");
        assert!(bool::from_scpi("1").unwrap());
        assert!(!bool::from_scpi("off").unwrap());
        assert!(bool::from_scpi("2").is_err());
    }

    // -----------------------------------------------------------------------
    // format_command
    // -----------------------------------------------------------------------

    #[test]
    fn format_float_fixed_point() {
        assert_eq!(
            format_command("FREQ:STAR %f", &10.0).unwrap(),
            "FREQ:STAR 10.000000"
        );
        assert_eq!(
            format_command("FREQ:STOP %f", &2.5e9).unwrap(),
            "FREQ:STOP 2500000000.000000"
        );
    }

    #[test]
    fn format_keeps_suffix() {
        assert_eq!(
            format_command("BAND:VID %fHz", &1.0).unwrap(),
            "BAND:VID 1.000000Hz"
        );
    }

    #[test]
    fn format_bool_with_string_placeholder() {
        assert_eq!(
            format_command("BAND:AUTO %s", &true).unwrap(),
            "BAND:AUTO ON"
        );
    }

    #[test]
    fn format_without_placeholder_is_error() {
        assert!(matches!(
            format_command("BAND:AUTO OFF", &1.0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn format_skips_literal_percent() {
        assert_eq!(
            format_command("DISP:TEXT '5%' %f", &1.0).unwrap(),
            "DISP:TEXT '5%' 1.000000"
        );
    }

    // -----------------------------------------------------------------------
    // encode / completion / lists
    // -----------------------------------------------------------------------

    #[test]
    fn encode_appends_terminator_once() {
        assert_eq!(encode_line("FREQ:STAR?"), b"FREQ:STAR?\n");
        assert_eq!(encode_line("*RST\n"), b"*RST\n");
    }

    #[test]
    fn completion_code_mapping() {
        assert_eq!(completion_code("1").unwrap(), 0);
        assert_eq!(completion_code("+1\r").unwrap(), 0);
        assert_eq!(completion_code("0").unwrap(), 1);
        assert!(completion_code("").is_err());
    }

    #[test]
    fn real_list_parsing() {
        assert_eq!(
            parse_real_list("-80.5,-79.25,-10\n").unwrap(),
            vec![-80.5, -79.25, -10.0]
        );
        assert!(parse_real_list("").unwrap().is_empty());
        assert!(parse_real_list("-80.5,abc").is_err());
    }
}
