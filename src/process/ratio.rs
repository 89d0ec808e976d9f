//! Percent-of-peak rescaling
//!
//! Each value becomes `value × 100 / max`, rounded half-up to two decimal
//! places. The arithmetic is exact: values are integers, so the result is a
//! rational number that is rounded once in `i128` and only then turned into
//! a float.
//!
//! The fixed-point scale of the channel cancels out of the ratio, so raw
//! wire values can be used directly.

use crate::types::Sample;

use super::ProcessedSample;

/// Hundredths in one unit of output.
const HUNDREDTHS: i128 = 100;
/// Output value of the series maximum.
const PERCENT: i128 = 100;

/// Largest valid raw value in the series.
pub fn valid_max(samples: &[Sample]) -> Option<i64> {
    samples.iter().filter(|s| s.is_valid()).map(|s| s.raw).max()
}

/// `raw × 100 / max` rounded half-up to two decimal places.
///
/// Returns `None` for a zero or negative maximum.
pub fn rescale_value(raw: i64, max: i64) -> Option<f64> {
    if max <= 0 {
        return None;
    }
    let hundredths = div_round_half_up(i128::from(raw) * PERCENT * HUNDREDTHS, i128::from(max));
    Some(hundredths as f64 / HUNDREDTHS as f64)
}

/// Rescale a series so its largest valid value reads 100.
///
/// Invalid samples do not take part in the maximum and are emitted as 0 and
/// flagged invalid. A series whose maximum is zero or negative comes out as
/// all zeros.
pub fn rescale_series(samples: &[Sample]) -> Vec<ProcessedSample> {
    let max = valid_max(samples).filter(|max| *max > 0);
    samples
        .iter()
        .map(|sample| {
            let valid = sample.is_valid();
            let value = match max {
                Some(max) if valid => rescale_value(sample.raw, max).unwrap_or(0.0),
                _ => 0.0,
            };
            ProcessedSample { timestamp_millis: sample.timestamp_millis, value, valid }
        })
        .collect()
}

/// Integer division rounding ties away from zero. `denominator` is positive.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator { quotient + numerator.signum() } else { quotient }
}
