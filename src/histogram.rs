//! Log-scaled fixed-bin histogram
//!
//! A cheap alternative to [`crate::quantiles::TDigest`] for distributions
//! where a fixed, compile-time-chosen relative precision is good enough
//! and an allocation-free, constant-size-after-construction structure
//! matters more than tail accuracy. Bin widths grow geometrically with
//! ratio `1 + ε`, so relative error in the reported quantile is bounded
//! by `ε` regardless of where in the distribution it falls.
//!
//! Bucketing uses a fast IEEE-754 bit-trick approximation of `log2`
//! instead of a real logarithm, accurate to within ±0.01 and exact at
//! every power of two, which is enough to place a value in the right
//! geometric bin.

use crate::common::validation::{validate_bin_count, validate_histogram_bounds};
use crate::common::{Mergeable, Result, Sketch, SketchError};

/// Fast approximate `log2`, accurate to within ±0.01 and exact at
/// powers of two.
///
/// Extracts the biased IEEE-754 exponent, rebuilds the mantissa as a
/// value in `[1, 2)`, and applies a quadratic correction
/// (`m·(2 − m/3) + e − 2/3`) that is exact at the bin edges `m = 1` and
/// `m = 2`.
pub fn approx_log2(v: f64) -> f64 {
    let bits = v.to_bits();
    let exponent_bits = (bits >> 52) & 0x7FF;
    let e = exponent_bits as f64 - 1024.0;

    let mantissa_bits = (bits & 0x000F_FFFF_FFFF_FFFF) | (1023u64 << 52);
    let m = f64::from_bits(mantissa_bits);

    m * (2.0 - m / 3.0) + e - 2.0 / 3.0
}

/// Inverse of [`approx_log2`]. Round-trips to within `1e-13` absolute
/// for `x` in `(0.001, 100)`.
pub fn pow2(x: f64) -> f64 {
    let e = x.floor() - 1.0;
    let x_frac = x - e;
    let m = 3.0 - (7.0 - 3.0 * x_frac).sqrt();
    2f64.powf(e + 1.0) * m
}

/// A fixed-bin histogram over positive reals with geometric bin widths.
///
/// # Examples
///
/// ```
/// use tdigest_sketch::histogram::LogHistogram;
///
/// let mut h = LogHistogram::new(1.0, 1_000_000.0, 0.01).unwrap();
/// for i in 1..=10_000 {
///     h.fit(i as f64).unwrap();
/// }
/// let median = h.quantile(0.5).unwrap();
/// assert!(median > 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct LogHistogram {
    min: f64,
    max: f64,
    eps: f64,
    log_factor: f64,
    log_offset: f64,
    counts: Vec<u64>,
}

impl LogHistogram {
    /// Creates a histogram over `[min, max]` with geometric bin widths
    /// of ratio `1 + eps`.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `min`/`max` are not both
    /// positive, `max ≤ 2·min`, `eps` is outside `[1e-6, 0.5]`, or the
    /// derived bin count exceeds [`crate::common::validation::MAX_HISTOGRAM_BINS`].
    pub fn new(min: f64, max: f64, eps: f64) -> Result<Self> {
        validate_histogram_bounds(min, max)?;
        if !(1e-6..=0.5).contains(&eps) {
            return Err(SketchError::BadInput {
                param: "eps".to_string(),
                value: eps.to_string(),
                constraint: "must be in [1e-6, 0.5]".to_string(),
            });
        }

        let log_factor = std::f64::consts::LN_2 / (1.0 + eps).ln();
        let log_offset = approx_log2(min) * log_factor;

        let idx_max = (approx_log2(max) * log_factor - log_offset).ceil() as i64;
        let bin_count = (idx_max.max(0) as usize) + 1;
        validate_bin_count(bin_count)?;

        Ok(LogHistogram {
            min,
            max,
            eps,
            log_factor,
            log_offset,
            counts: vec![0u64; bin_count],
        })
    }

    /// Number of bins.
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// Total number of samples absorbed.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Lower edge of bin `i` (0-indexed).
    pub fn lower(&self, i: usize) -> f64 {
        pow2((i as f64 + self.log_offset) / self.log_factor)
    }

    /// Maps a value to its 0-indexed bin, clamping out-of-range values
    /// to the first or last bin.
    pub fn bucket(&self, x: f64) -> usize {
        if x <= self.min {
            return 0;
        }
        if x >= self.max {
            return self.counts.len() - 1;
        }
        let idx = (approx_log2(x) * self.log_factor - self.log_offset).ceil() as i64;
        (idx - 1).clamp(0, self.counts.len() as i64 - 1) as usize
    }

    fn is_conformal(&self, other: &LogHistogram) -> bool {
        self.min == other.min
            && self.max == other.max
            && self.eps == other.eps
            && self.counts.len() == other.counts.len()
    }

    /// Adds one sample.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `x` is not a positive,
    /// finite real.
    pub fn fit(&mut self, x: f64) -> Result<()> {
        if !x.is_finite() || x <= 0.0 {
            return Err(SketchError::BadInput {
                param: "x".to_string(),
                value: x.to_string(),
                constraint: "must be a positive, finite real".to_string(),
            });
        }
        let b = self.bucket(x);
        self.counts[b] += 1;
        Ok(())
    }

    /// Adds the bin counts of `other` into this histogram.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if the two histograms are not
    /// conformal (same bounds, same epsilon, same bin count).
    pub fn merge(&mut self, other: &LogHistogram) -> Result<()> {
        if !self.is_conformal(other) {
            return Err(SketchError::BadInput {
                param: "other".to_string(),
                value: "non-conformal histogram".to_string(),
                constraint: "must share min, max, eps, and bin count".to_string(),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        Ok(())
    }

    /// Fraction of the distribution at or below `x`, treating each
    /// bin's mass as concentrated at its lower edge.
    pub fn cdf(&self, x: f64) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        if x < self.min {
            return 0.0;
        }
        if x >= self.max {
            return 1.0;
        }
        let b = self.bucket(x);
        let cumulative: u64 = self.counts[..=b].iter().sum();
        cumulative as f64 / total as f64
    }

    /// Value at quantile `q ∈ [0, 1]`: the lower edge of the first bin
    /// whose cumulative mass reaches `q`.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `q` is outside `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(SketchError::BadInput {
                param: "q".to_string(),
                value: q.to_string(),
                constraint: "must be in [0.0, 1.0]".to_string(),
            });
        }
        let total = self.total();
        if total == 0 {
            return Ok(f64::NAN);
        }
        let target = q * total as f64;
        let mut cumulative = 0.0;
        for (i, &c) in self.counts.iter().enumerate() {
            cumulative += c as f64;
            if cumulative >= target {
                return Ok(self.lower(i));
            }
        }
        Ok(self.max)
    }

    /// Serializes bounds and bin counts to a simple, crate-internal
    /// wire format (not part of any documented cross-language contract).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.counts.len() * 8);
        out.extend_from_slice(&self.min.to_le_bytes());
        out.extend_from_slice(&self.max.to_le_bytes());
        out.extend_from_slice(&self.eps.to_le_bytes());
        out.extend_from_slice(&(self.counts.len() as u32).to_le_bytes());
        for &c in &self.counts {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out
    }

    /// Deserializes a histogram written by [`LogHistogram::to_bytes`].
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if the buffer is truncated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 28 {
            return Err(SketchError::BadInput {
                param: "buffer".to_string(),
                value: bytes.len().to_string(),
                constraint: "must contain at least 28 bytes".to_string(),
            });
        }
        let min = f64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let max = f64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let eps = f64::from_le_bytes(bytes[16..24].try_into().unwrap());
        let bin_count = u32::from_le_bytes(bytes[24..28].try_into().unwrap()) as usize;

        if bytes.len() < 28 + bin_count * 8 {
            return Err(SketchError::BadInput {
                param: "buffer".to_string(),
                value: bytes.len().to_string(),
                constraint: format!("must contain {} bytes of bin counts", bin_count * 8),
            });
        }

        let mut h = LogHistogram::new(min, max, eps)?;
        for (i, c) in h.counts.iter_mut().enumerate() {
            let offset = 28 + i * 8;
            *c = u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
        }
        Ok(h)
    }
}

impl Sketch for LogHistogram {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        let _ = self.fit(*item);
    }

    fn estimate(&self) -> f64 {
        self.quantile(0.5).unwrap_or(f64::NAN)
    }

    fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        LogHistogram::from_bytes(bytes)
    }
}

impl Mergeable for LogHistogram {
    fn merge(&mut self, other: &Self) -> Result<()> {
        LogHistogram::merge(self, other)
    }
}

/// A signed variant of [`LogHistogram`] that keeps parallel bin arrays
/// for the positive and negative half-lines, bucketed on magnitude.
///
/// Values are split at zero: `x > 0` lands in the positive histogram,
/// `x < 0` lands in the negative one keyed on `|x|`. Zero itself is
/// outside the domain (the log histogram's domain is strictly
/// positive), so `fit(0.0)` is rejected.
#[derive(Clone, Debug)]
pub struct SignedLogHistogram {
    pos: LogHistogram,
    neg: LogHistogram,
}

impl SignedLogHistogram {
    /// Creates a signed histogram; `min`/`max`/`eps` describe the
    /// magnitude range and bin width shared by both halves.
    ///
    /// # Errors
    /// See [`LogHistogram::new`].
    pub fn new(min: f64, max: f64, eps: f64) -> Result<Self> {
        Ok(SignedLogHistogram {
            pos: LogHistogram::new(min, max, eps)?,
            neg: LogHistogram::new(min, max, eps)?,
        })
    }

    /// Total number of samples absorbed across both halves.
    pub fn total(&self) -> u64 {
        self.pos.total() + self.neg.total()
    }

    /// Adds one signed sample.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] for zero, NaN, or infinite
    /// input.
    pub fn fit(&mut self, x: f64) -> Result<()> {
        if !x.is_finite() || x == 0.0 {
            return Err(SketchError::BadInput {
                param: "x".to_string(),
                value: x.to_string(),
                constraint: "must be a nonzero, finite real".to_string(),
            });
        }
        if x > 0.0 {
            self.pos.fit(x)
        } else {
            self.neg.fit(-x)
        }
    }

    /// Merges both halves of `other` into this histogram.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if either half is not
    /// conformal.
    pub fn merge(&mut self, other: &SignedLogHistogram) -> Result<()> {
        self.pos.merge(&other.pos)?;
        self.neg.merge(&other.neg)?;
        Ok(())
    }

    /// Fraction of the distribution at or below `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        let neg_total = self.neg.total() as f64;
        let pos_total = self.pos.total() as f64;
        let total = total as f64;

        if x >= 0.0 {
            let frac_pos = if pos_total > 0.0 { self.pos.cdf(x.max(self.pos_min())) } else { 1.0 };
            (neg_total + frac_pos * pos_total) / total
        } else {
            let mag = -x;
            let frac_neg_at_or_above = if neg_total > 0.0 {
                1.0 - self.neg.cdf(mag)
            } else {
                0.0
            };
            (frac_neg_at_or_above * neg_total) / total
        }
    }

    fn pos_min(&self) -> f64 {
        self.pos.min
    }
}
