//! Raw-to-microvolt conversions for EEG readings
//!
//! Two unrelated mappings exist for the same 24-bit readings and they
//! disagree, so neither is applied implicitly. Callers pick one through
//! [`VoltageMapping`].
//!
//! - [`direct_microvolts`] scales one decoded sample.
//! - [`legacy_triplet_microvolts`] rebuilds a 24-bit word from the low bytes
//!   of three consecutive decoded samples. This is the older display path and
//!   does not agree with the per-sample decode.

use serde::{Deserialize, Serialize};

/// Full-scale input range in microvolts.
pub const FULL_SCALE_MICROVOLTS: f64 = 4500.0;
/// Full-scale 24-bit magnitude, 2^23 - 1.
pub const FULL_SCALE_COUNTS: f64 = 8_388_607.0;

const WORD_MASK: i64 = 0x00FF_FFFF;
const SIGN_BIT: i64 = 0x0080_0000;
const MODULUS: i64 = 0x0100_0000;

/// Scale one signed 24-bit reading to microvolts.
pub fn direct_microvolts(raw: i64) -> f64 {
    raw as f64 * FULL_SCALE_MICROVOLTS / FULL_SCALE_COUNTS
}

/// Recombine `values[index-3..index]` into one 24-bit word and map it to
/// microvolts.
///
/// Returns `None` when fewer than three values precede `index`.
///
/// ```rust
/// use brainwave::process::legacy_triplet_microvolts;
///
/// let max = legacy_triplet_microvolts(&[0x7F, 0xFF, 0xFF], 3).unwrap();
/// assert_eq!(max, 4500.0);
/// assert_eq!(legacy_triplet_microvolts(&[1, 2], 2), None);
/// ```
pub fn legacy_triplet_microvolts(values: &[i64], index: usize) -> Option<f64> {
    let start = index.checked_sub(3)?;
    let [high, mid, low] = values.get(start..index)? else {
        return None;
    };
    let word = ((high << 16) | (mid << 8) | low) & WORD_MASK;
    let microvolts = if word & SIGN_BIT != 0 {
        (MODULUS - word) as f64 * -FULL_SCALE_MICROVOLTS / FULL_SCALE_COUNTS
    } else {
        word as f64 * FULL_SCALE_MICROVOLTS / FULL_SCALE_COUNTS
    };
    Some(microvolts)
}

/// Which raw-to-microvolt conversion to apply to an EEG series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoltageMapping {
    /// Each sample scaled on its own
    #[default]
    Direct,
    /// Three-sample recombination; the first three samples pass through raw
    LegacyTriplet,
}

impl VoltageMapping {
    pub fn convert(&self, values: &[i64]) -> Vec<f64> {
        match self {
            Self::Direct => values.iter().map(|raw| direct_microvolts(*raw)).collect(),
            Self::LegacyTriplet => (0..values.len())
                .map(|index| {
                    legacy_triplet_microvolts(values, index).unwrap_or(values[index] as f64)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_full_scale() {
        assert_eq!(direct_microvolts(0), 0.0);
        assert_eq!(direct_microvolts(8_388_607), 4500.0);
        assert_eq!(direct_microvolts(-8_388_607), -4500.0);
    }

    #[test]
    fn triplet_positive_word() {
        // 0x000100 = 256
        let value = legacy_triplet_microvolts(&[0, 1, 0], 3).unwrap();
        assert_eq!(value, 256.0 * 4500.0 / 8_388_607.0);
    }

    #[test]
    fn triplet_sign_bit_maps_negative() {
        let value = legacy_triplet_microvolts(&[0x80, 0x00, 0x00], 3).unwrap();
        assert_eq!(value, -4500.0 * 8_388_608.0 / 8_388_607.0);

        let minus_one = legacy_triplet_microvolts(&[0xFF, 0xFF, 0xFF], 3).unwrap();
        assert!(minus_one < 0.0 && minus_one > -0.001);
    }

    #[test]
    fn triplet_masks_wide_inputs_to_24_bits() {
        // Negative decoded values carry high bits that must not leak in
        let wide = legacy_triplet_microvolts(&[-1, 0, 0], 3).unwrap();
        let narrow = legacy_triplet_microvolts(&[0xFF, 0, 0], 3).unwrap();
        assert_eq!(wide, narrow);
    }

    #[test]
    fn triplet_needs_three_predecessors() {
        assert_eq!(legacy_triplet_microvolts(&[1, 2, 3], 2), None);
        assert_eq!(legacy_triplet_microvolts(&[1, 2, 3], 4), None);
    }

    #[test]
    fn mappings_disagree_on_the_same_series() {
        let values = [100, 200, 300, 400];
        let direct = VoltageMapping::Direct.convert(&values);
        let legacy = VoltageMapping::LegacyTriplet.convert(&values);
        assert_eq!(&legacy[..3], &[100.0, 200.0, 300.0]);
        assert_ne!(direct[3], legacy[3]);
    }
}
