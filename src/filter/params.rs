//! Filter sizing: (capacity, false-positive rate) → (bit count, hash count).
//!
//! ```text
//! f = (0.6185) ^ (m/n)
//! m = -ln(p) * n / 0.6185
//! k = 0.6931 * m / n  (+1)
//! ```

use crate::error::{BloomError, Result};

/// Bits per "byte" of the underlying buffer.
pub const BYTE_BITS: u32 = 8;

/// The bit array is always sized in whole 64-bit words.
pub const BIT_ALIGN: u64 = 64;

const FILL_BASE: f64 = 0.6185;
const LN_2_APPROX: f64 = 0.6931;

/// Sizing results plus the inputs they were derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub capacity: u32,
    pub false_positive_rate: f64,
    pub bit_count: u32,
    pub hash_func_count: u32,
}

impl FilterParams {
    /// Size a filter for `capacity` items at `false_positive_rate`.
    pub fn compute(capacity: u32, false_positive_rate: f64) -> Result<Self> {
        check_rate(false_positive_rate)?;
        if capacity == 0 {
            return Err(BloomError::InvalidParameter(
                "capacity must be greater than zero".into(),
            ));
        }

        let raw_bits = (-false_positive_rate.ln() * capacity as f64 / FILL_BASE).ceil();
        // Saturates for absurd inputs; caught by the range check below.
        let bits = (raw_bits as u64).max(1).div_ceil(BIT_ALIGN) * BIT_ALIGN;
        let bit_count = u32::try_from(bits).map_err(|_| {
            BloomError::InvalidParameter(format!(
                "{bits} bits needed for n={capacity}, p={false_positive_rate} exceeds the 32-bit limit"
            ))
        })?;

        let hash_func_count = (LN_2_APPROX * bit_count as f64 / capacity as f64) as u32 + 1;

        Ok(Self {
            capacity,
            false_positive_rate,
            bit_count,
            hash_func_count,
        })
    }

    /// Length of the bit buffer in bytes.
    pub fn byte_count(&self) -> u32 {
        self.bit_count / BYTE_BITS
    }
}

pub(crate) fn check_rate(rate: f64) -> Result<()> {
    // NaN fails both comparisons.
    if rate > 0.0 && rate < 1.0 {
        Ok(())
    } else {
        Err(BloomError::InvalidParameter(format!(
            "false positive rate must be in (0, 1), got {rate}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sizing() {
        let p = FilterParams::compute(100_000, 0.00001).unwrap();
        assert_eq!(p.bit_count, 1_861_440);
        assert_eq!(p.hash_func_count, 13);
        assert_eq!(p.byte_count(), 232_680);
    }

    #[test]
    fn test_small_sizing() {
        let p = FilterParams::compute(1000, 0.01).unwrap();
        assert_eq!(p.bit_count, 7488);
        assert_eq!(p.hash_func_count, 6);
    }

    #[test]
    fn test_alignment_and_min_hashes() {
        for &n in &[1u32, 7, 64, 1000, 123_457] {
            for &rate in &[0.5, 0.1, 0.01, 1e-4, 1e-7, 0.999] {
                let p = FilterParams::compute(n, rate).unwrap();
                assert_eq!(p.bit_count % 64, 0, "n={n} p={rate}");
                assert!(p.bit_count >= 64);
                assert!(p.hash_func_count >= 1);
                assert_eq!(p.byte_count() * 8, p.bit_count);
            }
        }
    }

    #[test]
    fn test_rejects_rate_out_of_range() {
        for rate in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                FilterParams::compute(100, rate),
                Err(BloomError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(matches!(
            FilterParams::compute(0, 0.01),
            Err(BloomError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_filter() {
        assert!(matches!(
            FilterParams::compute(u32::MAX, 1e-300),
            Err(BloomError::InvalidParameter(_))
        ));
    }
}
