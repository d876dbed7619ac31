//! Formatting and conversion helpers for spectrum measurements.

/// Format a frequency in hertz with an engineering prefix.
///
/// Picks the largest of GHz, MHz, kHz and Hz that keeps the mantissa at or
/// above one, and prints six decimal places.
///
/// # Example
///
/// ```
/// use esalib_core::format_freq_hz;
///
/// assert_eq!(format_freq_hz(2.4e9), "2.400000 GHz");
/// assert_eq!(format_freq_hz(10.0), "10.000000 Hz");
/// ```
pub fn format_freq_hz(freq_hz: f64) -> String {
    let abs = freq_hz.abs();
    if abs >= 1e9 {
        format!("{:.6} GHz", freq_hz / 1e9)
    } else if abs >= 1e6 {
        format!("{:.6} MHz", freq_hz / 1e6)
    } else if abs >= 1e3 {
        format!("{:.6} kHz", freq_hz / 1e3)
    } else {
        format!("{freq_hz:.6} Hz")
    }
}

/// Return `points` evenly spaced values from `start` to `stop` inclusive.
///
/// This is how an analyzer distributes its sweep points across the span,
/// so it maps trace indices to frequencies.
///
/// # Example
///
/// ```
/// use esalib_core::linspace;
///
/// assert_eq!(linspace(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
/// assert_eq!(linspace(5.0, 9.0, 1), vec![5.0]);
/// ```
pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_freq_prefixes() {
        assert_eq!(format_freq_hz(50e9), "50.000000 GHz");
        assert_eq!(format_freq_hz(100e6), "100.000000 MHz");
        assert_eq!(format_freq_hz(1500.0), "1.500000 kHz");
        assert_eq!(format_freq_hz(0.0), "0.000000 Hz");
    }

    #[test]
    fn linspace_endpoints() {
        let v = linspace(1e6, 2e6, 11);
        assert_eq!(v.len(), 11);
        assert_eq!(v[0], 1e6);
        assert!((v[10] - 2e6).abs() < 1e-6);
        assert!((v[5] - 1.5e6).abs() < 1e-6);
    }

    #[test]
    fn linspace_empty() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
