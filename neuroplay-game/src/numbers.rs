//! Numeric conversion helpers centralizing percent math and safe casts.

use num_traits::cast::cast;

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Round a f64 and clamp it into `0..=100`, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, 100.0).round();
    cast::<f64, u8>(clamped).unwrap_or(0)
}

/// `round(100 * numerator / denominator)`, clamped to `0..=100`.
///
/// A zero denominator yields 0.
#[must_use]
pub fn percent(numerator: usize, denominator: usize) -> u8 {
    if denominator == 0 {
        return 0;
    }
    round_f64_to_percent(100.0 * usize_to_f64(numerator) / usize_to_f64(denominator))
}

/// Rounded arithmetic mean of percent-scale values, `None` when empty.
#[must_use]
pub fn mean_percent(values: &[u8]) -> Option<u8> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| f64::from(*v)).sum();
    Some(round_f64_to_percent(sum / usize_to_f64(values.len())))
}

/// Unrounded arithmetic mean, `None` when empty.
#[must_use]
pub fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / usize_to_f64(values.len()))
}

/// Milliseconds to whole seconds, rounded half up.
#[must_use]
pub const fn ms_to_rounded_seconds(ms: u64) -> u64 {
    ms.saturating_add(500) / 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up_and_handles_zero() {
        assert_eq!(percent(4, 5), 80);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 0), 0);
        assert_eq!(percent(7, 5), 100);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_percent(f64::NAN), 0);
        assert_eq!(round_f64_to_percent(-4.0), 0);
        assert_eq!(round_f64_to_percent(99.5), 100);
    }

    #[test]
    fn means_skip_empty_input() {
        assert_eq!(mean_percent(&[]), None);
        assert_eq!(mean_percent(&[100, 50, 75]), Some(75));
        assert!(mean_f64(&[]).is_none());
        assert!((mean_f64(&[1.0, 2.0]).unwrap() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn seconds_round_half_up() {
        assert_eq!(ms_to_rounded_seconds(0), 0);
        assert_eq!(ms_to_rounded_seconds(1_499), 1);
        assert_eq!(ms_to_rounded_seconds(1_500), 2);
    }
}
