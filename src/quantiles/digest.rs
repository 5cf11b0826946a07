//! T-Digest: a mergeable streaming quantile sketch with tail-biased accuracy
//!
//! A t-digest keeps a sorted sequence of *centroids*, `(mean, count)`
//! pairs that summarize clusters of samples. Where a centroid is allowed
//! to grow is controlled by a [`ScaleFunction`]: centroids near the
//! median may absorb many samples, while centroids near `q = 0` or
//! `q = 1` stay small, so extreme quantiles (p99.9, p0.01) are reported
//! with much less error than the median at the same memory budget.
//!
//! # Algorithm overview
//!
//! New samples are appended as singleton centroids. Once the buffer
//! grows past a threshold, `compress` sorts the whole sequence and
//! greedily re-merges it so that no non-singleton centroid spans more
//! than one unit of scale coordinate. The first and last centroids are
//! always kept singleton, so `min`/`max` are always exact.
//!
//! Internally the digest works at a larger *private* compression `δ'`
//! than the *public* one a caller asked for; a forced compression at the
//! public `δ` is what callers see via [`TDigest::compress`] and
//! serialization. This two-level scheme keeps more detail around for
//! queries while presenting a smaller, smoother digest externally.
//!
//! # References
//!
//! - Dunning & Ertl, "Computing Extremely Accurate Quantiles Using
//!   t-Digests" (2019)
//! - <https://github.com/tdunning/t-digest>

use crate::common::validation::{
    validate_finite, validate_finite_strict, validate_min_size, validate_unit_interval,
    MIN_COMPRESSION,
};
use crate::common::{Mergeable, Result, Sketch, SketchError};
use crate::quantiles::centroid::{merge_centroids, Centroid};
use crate::quantiles::scale::ScaleFunction;

const MAX_CHUNK: usize = 10_000;

/// Encoding tag for the verbose serialization form (§6 of the wire format).
const TAG_VERBOSE: u32 = 1;
/// Encoding tag for the small serialization form.
const TAG_SMALL: u32 = 2;

/// A mergeable streaming quantile sketch biased toward tail accuracy.
///
/// # Examples
///
/// ```
/// use tdigest_sketch::TDigest;
///
/// let mut td = TDigest::new(100.0);
/// for i in 0..10_000 {
///     td.fit(i as f64).unwrap();
/// }
///
/// let median = td.quantile(0.5).unwrap();
/// let p999 = td.quantile(0.999).unwrap();
/// assert!((median - 5000.0).abs() < 50.0);
/// assert!(p999 > 9900.0);
/// ```
#[derive(Clone, Debug)]
pub struct TDigest {
    public_compression: f64,
    private_compression: f64,
    scale: ScaleFunction,
    max_pending: usize,
    max_size: usize,
    use_two_level: bool,
    centroids: Vec<Centroid>,
    total_weight: f64,
    merge_count: u64,
    watermark: usize,
    is_reversed: bool,
    log_samples: bool,
    sample_log: Option<Vec<Vec<f64>>>,
}

impl TDigest {
    const BUFFER_FACTOR: f64 = 5.0;

    /// Creates a digest with the default scale function (K3) and
    /// two-level compression on. `δ` is clamped to a minimum of 10.
    pub fn new(delta: f64) -> Self {
        Self::with_scale(delta, ScaleFunction::default())
    }

    /// Creates a digest using an explicit scale function.
    pub fn with_scale(delta: f64, scale: ScaleFunction) -> Self {
        let max_pending = (delta.max(MIN_COMPRESSION) * Self::BUFFER_FACTOR) as usize;
        Self::new_typed(delta, max_pending, true, scale)
    }

    /// Rust analogue of the source's `new_typed<T_mean, T_count>`. This
    /// crate fixes both the mean and count representations to `f64` (the
    /// generic mean/count type parameters are an artifact of the host
    /// language's numeric-tower story, not part of the observable
    /// semantics), so only the remaining four construction parameters
    /// are exposed.
    pub fn new_typed(
        delta: f64,
        max_pending: usize,
        use_two_level: bool,
        scale: ScaleFunction,
    ) -> Self {
        let public_compression = delta.max(MIN_COMPRESSION);
        let max_size = 2.0 * public_compression + (max_pending as f64).max(50.0);
        let max_size = max_size as usize;
        let private_compression = if use_two_level {
            public_compression * (max_size as f64 / (2.0 * public_compression)).sqrt()
        } else {
            public_compression
        };

        TDigest {
            public_compression,
            private_compression,
            scale,
            max_pending,
            max_size,
            use_two_level,
            centroids: Vec::new(),
            total_weight: 0.0,
            merge_count: 0,
            watermark: 0,
            is_reversed: false,
            log_samples: false,
            sample_log: None,
        }
    }

    /// Enables the optional per-centroid sample log used for debugging
    /// merge/compression decisions. Off by default; production use
    /// should leave this disabled (it defeats the digest's bounded
    /// memory footprint).
    pub fn with_sample_log(mut self) -> Self {
        self.log_samples = true;
        self.sample_log = Some(Vec::new());
        self
    }

    /// The publicly visible compression parameter `δ`.
    pub fn compression(&self) -> f64 {
        self.public_compression
    }

    /// The number of centroids currently held (before an implicit
    /// compress; call [`TDigest::compress`] first for an exact count).
    pub fn length(&self) -> usize {
        self.centroids.len()
    }

    /// Total weight (sample count) ingested so far.
    pub fn count(&self) -> f64 {
        self.total_weight
    }

    /// Minimum value seen, or `NaN` if empty.
    pub fn min(&self) -> f64 {
        self.centroids.first().map_or(f64::NAN, |c| c.mean)
    }

    /// Maximum value seen, or `NaN` if empty.
    pub fn max(&self) -> f64 {
        self.centroids.last().map_or(f64::NAN, |c| c.mean)
    }

    /// `true` if no samples have been added.
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    // ---- Insertion ---------------------------------------------------

    /// Adds a single real-valued sample.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `value` is NaN.
    pub fn fit(&mut self, value: f64) -> Result<()> {
        validate_finite(value, "value")?;
        self.push_singleton(value);
        if self.centroids.len() > self.max_size {
            self.compress_pass(false, self.private_compression)?;
        }
        Ok(())
    }

    /// Adds a batch of samples, chunking internally so no single
    /// compression pass has to process more than
    /// [`MAX_CHUNK`](constant@MAX_CHUNK) newly appended singletons at
    /// a time.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] on the first NaN encountered;
    /// samples before it have already been ingested.
    pub fn fit_slice(&mut self, values: &[f64]) -> Result<()> {
        for chunk in values.chunks(MAX_CHUNK) {
            for &v in chunk {
                self.fit(v)?;
            }
        }
        Ok(())
    }

    fn push_singleton(&mut self, value: f64) {
        self.centroids.push(Centroid::singleton(value));
        self.total_weight += 1.0;
        if let Some(log) = &mut self.sample_log {
            log.push(vec![value]);
        }
    }

    // ---- Merge ---------------------------------------------------------

    /// Merges another digest's centroids into this one.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if this digest keeps a sample
    /// log but `other` does not (the logs would become inconsistent).
    pub fn merge(&mut self, other: &TDigest) -> Result<()> {
        if self.log_samples && !other.log_samples {
            return Err(SketchError::BadInput {
                param: "other".to_string(),
                value: "logData=false".to_string(),
                constraint: "must also keep a sample log when the target does".to_string(),
            });
        }

        self.centroids.extend_from_slice(&other.centroids);
        self.total_weight += other.total_weight;
        if let (Some(log), Some(other_log)) = (&mut self.sample_log, &other.sample_log) {
            log.extend_from_slice(other_log);
        }

        if self.centroids.len() > self.max_size {
            self.compress_pass(false, self.private_compression)?;
        }
        Ok(())
    }

    // ---- Compression -----------------------------------------------------

    /// Runs a forced compression at the public compression `δ`. Shrinks
    /// and smooths the digest to the externally documented size; must
    /// be called before serialization.
    ///
    /// # Errors
    /// Returns [`SketchError::InvariantViolated`] if an internal
    /// assertion fails. This indicates a bug in this crate.
    pub fn compress(&mut self) -> Result<()> {
        let delta = self.public_compression;
        self.compress_pass(true, delta)
    }

    /// One compression pass, parameterized by direction-forcing and by
    /// which compression level (public or private) is in effect. `fit`
    /// and `merge` call this with `force = false` at the private level
    /// when the buffer overflows; [`TDigest::compress`], `cdf`, and
    /// `quantile` call it forced.
    fn compress_pass(&mut self, force: bool, delta_eff: f64) -> Result<()> {
        let n = self.centroids.len();
        if n < 2 {
            self.watermark = n;
            return Ok(());
        }

        let ascending = force || self.merge_count % 2 == 0;

        if ascending == self.is_reversed {
            self.centroids[..self.watermark].reverse();
            if let Some(log) = &mut self.sample_log {
                log[..self.watermark].reverse();
            }
        }

        self.stable_sort(ascending);

        if ascending && !force && (self.centroids.len() as f64) < delta_eff {
            self.watermark = self.centroids.len();
            self.is_reversed = !ascending;
            return Ok(());
        }

        self.greedy_merge(delta_eff)?;

        self.merge_count += 1;
        self.is_reversed = !ascending;
        self.watermark = self.centroids.len();
        Ok(())
    }

    fn stable_sort(&mut self, ascending: bool) {
        let n = self.centroids.len();
        let mut order: Vec<usize> = (0..n).collect();
        if ascending {
            order.sort_by(|&a, &b| {
                self.centroids[a]
                    .mean
                    .partial_cmp(&self.centroids[b].mean)
                    .unwrap()
                    .then(a.cmp(&b))
            });
        } else {
            order.sort_by(|&a, &b| {
                self.centroids[b]
                    .mean
                    .partial_cmp(&self.centroids[a].mean)
                    .unwrap()
                    .then(a.cmp(&b))
            });
        }

        let sorted: Vec<Centroid> = order.iter().map(|&i| self.centroids[i]).collect();
        self.centroids = sorted;

        if let Some(log) = self.sample_log.take() {
            let sorted_log: Vec<Vec<f64>> = order.iter().map(|&i| log[i].clone()).collect();
            self.sample_log = Some(sorted_log);
        }
    }

    fn greedy_merge(&mut self, delta_eff: f64) -> Result<()> {
        let n = self.centroids.len();
        let total = self.total_weight;
        let norm = self.scale.normalizer(delta_eff, total);

        let mut to = 1usize;
        let mut w_so_far = self.centroids[0].count + self.centroids[1].count;
        let mut k0 = self.scale.k_norm(self.centroids[0].count / total, norm);
        let mut limit = total * self.scale.q_norm(k0 + 1.0, norm);

        let mut from = 2usize;
        while from < n {
            let candidate = w_so_far + self.centroids[from].count;
            if candidate > limit || from == n - 1 {
                to += 1;
                self.centroids[to] = self.centroids[from];
                if let Some(log) = &mut self.sample_log {
                    log[to] = log[from].clone();
                }
                w_so_far += self.centroids[from].count;
                k0 = self.scale.k_norm(w_so_far / total, norm);
                limit = total * self.scale.q_norm(k0 + 1.0, norm);
            } else {
                self.centroids[to] = merge_centroids(self.centroids[to], self.centroids[from]);
                if let Some(log) = &mut self.sample_log {
                    let moved = std::mem::take(&mut log[from]);
                    log[to].extend(moved);
                }
                w_so_far += self.centroids[from].count;
            }
            from += 1;
        }

        self.centroids.truncate(to + 1);
        if let Some(log) = &mut self.sample_log {
            log.truncate(to + 1);
        }

        if self.centroids.first().map(|c| c.count) != Some(1.0)
            || self.centroids.last().map(|c| c.count) != Some(1.0)
        {
            return Err(SketchError::InvariantViolated(
                "first or last centroid lost its singleton status during compression".to_string(),
            ));
        }
        Ok(())
    }

    // ---- Queries -----------------------------------------------------

    /// Estimates the fraction of the distribution at or below `x`.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `x` is NaN or infinite.
    pub fn cdf(&mut self, x: f64) -> Result<f64> {
        validate_finite_strict(x, "x")?;
        self.compress_pass(true, self.private_compression)?;

        if self.centroids.is_empty() {
            return Ok(f64::NAN);
        }
        if self.centroids.len() == 1 {
            let v = self.centroids[0].mean;
            return Ok(if x < v {
                0.0
            } else if x > v {
                1.0
            } else {
                0.5
            });
        }

        let total = self.total_weight;
        let min_mean = self.centroids[0].mean;
        let max_mean = self.centroids[self.centroids.len() - 1].mean;

        if x < min_mean {
            return Ok(0.0);
        }
        if x > max_mean {
            return Ok(1.0);
        }
        if x == min_mean {
            let tied: f64 = self
                .centroids
                .iter()
                .take_while(|c| c.mean <= x)
                .map(|c| c.count)
                .sum();
            return Ok(tied / (2.0 * total));
        }
        if x == max_mean {
            return Ok(1.0 - 0.5 / total);
        }

        let m = self.centroids.len();
        let mut weight_so_far = 0.0;
        let mut i = 0;
        while i < m {
            if self.centroids[i].mean == x {
                let mut run_count = 0.0;
                let mut j = i;
                while j < m && self.centroids[j].mean == x {
                    run_count += self.centroids[j].count;
                    j += 1;
                }
                return Ok((weight_so_far + run_count / 2.0) / total);
            }
            if i + 1 < m && self.centroids[i].mean < x && x < self.centroids[i + 1].mean {
                let c1 = self.centroids[i];
                let c2 = self.centroids[i + 1];
                if c1.is_singleton() && c2.is_singleton() {
                    return Ok((weight_so_far + 1.0) / total);
                }
                let left_excluded = if c1.is_singleton() { 0.5 } else { 0.0 };
                let right_excluded = if c2.is_singleton() { 0.5 } else { 0.0 };
                let dw = (c1.count + c2.count) / 2.0;
                let dw_no_singleton = dw - left_excluded - right_excluded;
                let frac = (x - c1.mean) / (c2.mean - c1.mean);
                return Ok(
                    (weight_so_far + c1.count / 2.0 + left_excluded + dw_no_singleton * frac)
                        / total,
                );
            }
            weight_so_far += self.centroids[i].count;
            i += 1;
        }

        Err(SketchError::InvariantViolated(
            "cdf walk fell through without bracketing x".to_string(),
        ))
    }

    /// Estimates the value at quantile `q ∈ [0, 1]`.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `q` is outside `[0, 1]`.
    pub fn quantile(&mut self, q: f64) -> Result<f64> {
        validate_unit_interval(q, "q")?;
        self.compress_pass(true, self.private_compression)?;

        if self.centroids.is_empty() {
            return Ok(f64::NAN);
        }
        if self.centroids.len() == 1 {
            return Ok(self.centroids[0].mean);
        }

        let total = self.total_weight;
        let index = q * total;
        let m = self.centroids.len();

        if index < 1.0 {
            return Ok(self.centroids[0].mean);
        }
        if index > total - 1.0 {
            return Ok(self.centroids[m - 1].mean);
        }

        let mut weight_so_far = self.centroids[0].count / 2.0;
        for i in 0..m - 1 {
            let c1 = self.centroids[i];
            let c2 = self.centroids[i + 1];
            let dw = (c1.count + c2.count) / 2.0;

            if weight_so_far + dw > index {
                let mut left_unit = 0.0;
                if c1.is_singleton() {
                    if index - weight_so_far < 0.5 {
                        return Ok(c1.mean);
                    }
                    left_unit = 0.5;
                }
                let mut right_unit = 0.0;
                if c2.is_singleton() {
                    if weight_so_far + dw - index <= 0.5 {
                        return Ok(c2.mean);
                    }
                    right_unit = 0.5;
                }

                let z2 = weight_so_far + dw - index - right_unit;
                let z1 = index - weight_so_far - left_unit;
                let mean = if z1 + z2 > 0.0 {
                    (c1.mean * z2 + c2.mean * z1) / (z1 + z2)
                } else {
                    (c1.mean + c2.mean) / 2.0
                };
                return Ok(mean.max(c1.mean).min(c2.mean));
            }
            weight_so_far += dw;
        }

        Ok(self.centroids[m - 1].mean)
    }

    /// Diagnostic check of every invariant from the data model: extreme
    /// centroids singleton, counts summing to `total_weight`, centroid
    /// count within `max_size`, and no non-singleton centroid spanning
    /// more than one unit of scale coordinate.
    ///
    /// # Errors
    /// Returns [`SketchError::InvariantViolated`] on the first violation
    /// found.
    pub fn check_weights(&self) -> Result<()> {
        if self.centroids.is_empty() {
            return Ok(());
        }

        let mut sorted = self.centroids.clone();
        sorted.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap());

        if sorted.first().unwrap().count != 1.0 {
            return Err(SketchError::InvariantViolated(
                "first centroid is not a singleton".to_string(),
            ));
        }
        if sorted.last().unwrap().count != 1.0 {
            return Err(SketchError::InvariantViolated(
                "last centroid is not a singleton".to_string(),
            ));
        }

        let sum: f64 = sorted.iter().map(|c| c.count).sum();
        if (sum - self.total_weight).abs() > 1e-6 * self.total_weight.max(1.0) {
            return Err(SketchError::InvariantViolated(format!(
                "centroid counts sum to {} but total_weight is {}",
                sum, self.total_weight
            )));
        }

        if sorted.len() > self.max_size {
            return Err(SketchError::InvariantViolated(format!(
                "{} centroids exceeds max_size {}",
                sorted.len(),
                self.max_size
            )));
        }

        let total = self.total_weight;
        let norm = self.scale.normalizer(self.public_compression, total);
        let mut cumulative = 0.0;
        let mut prev_k = self.scale.k_norm(0.0, norm);
        for c in &sorted {
            cumulative += c.count;
            let q = cumulative / total;
            let k = self.scale.k_norm(q, norm);
            if c.count > 1.0 && k - prev_k > 1.0 + 1e-6 {
                return Err(SketchError::InvariantViolated(format!(
                    "centroid spans {} units of scale coordinate",
                    k - prev_k
                )));
            }
            prev_k = k;
        }

        Ok(())
    }

    // ---- Serialization -------------------------------------------------

    /// Size in bytes that [`TDigest::to_bytes`] will produce after a
    /// forced compress. See [`TDigest::to_bytes`] for the wire layout.
    pub fn byte_size(&mut self) -> Result<usize> {
        self.compress()?;
        let m = self.centroids.len();
        Ok(32 + 16 * m.saturating_sub(2))
    }

    /// Size in bytes that [`TDigest::to_bytes_small`] will produce.
    pub fn small_byte_size(&mut self) -> Result<usize> {
        self.compress()?;
        let m = self.centroids.len();
        Ok(30 + 8 * m.saturating_sub(2))
    }

    /// Serializes the digest to the verbose wire format: a 32-byte
    /// header (tag, min, max, public compression, centroid count) plus
    /// `(count, mean)` pairs for every centroid except the first and
    /// last, which are reconstructed as singletons at `min`/`max`.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.compress()?;
        let m = self.centroids.len();

        let mut out = Vec::with_capacity(32 + 16 * m.saturating_sub(2));
        out.extend_from_slice(&TAG_VERBOSE.to_le_bytes());
        out.extend_from_slice(&self.min().to_le_bytes());
        out.extend_from_slice(&self.max().to_le_bytes());
        out.extend_from_slice(&self.public_compression.to_le_bytes());
        out.extend_from_slice(&(m as u32).to_le_bytes());

        if m > 2 {
            for c in &self.centroids[1..m - 1] {
                out.extend_from_slice(&c.count.to_le_bytes());
                out.extend_from_slice(&c.mean.to_le_bytes());
            }
        }
        Ok(out)
    }

    /// Deserializes a digest previously written by [`TDigest::to_bytes`].
    ///
    /// # Errors
    /// Returns [`SketchError::BadFormat`] for an unrecognized tag, or
    /// [`SketchError::BadInput`] for a truncated buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_min_size(bytes.len(), 32)?;
        let tag = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if tag != TAG_VERBOSE {
            return Err(SketchError::BadFormat { tag });
        }
        let min = f64::from_le_bytes(bytes[4..12].try_into().unwrap());
        let max = f64::from_le_bytes(bytes[12..20].try_into().unwrap());
        let compression = f64::from_le_bytes(bytes[20..28].try_into().unwrap());
        let m = u32::from_le_bytes(bytes[28..32].try_into().unwrap()) as usize;

        let expected = 32 + 16 * m.saturating_sub(2);
        validate_min_size(bytes.len(), expected)?;

        let mut digest = TDigest::new(compression);
        let mut centroids = Vec::with_capacity(m);
        if m >= 1 {
            centroids.push(Centroid::singleton(min));
        }
        let mut offset = 32;
        for _ in 0..m.saturating_sub(2) {
            let count = f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
            let mean = f64::from_le_bytes(bytes[offset + 8..offset + 16].try_into().unwrap());
            centroids.push(Centroid::new(mean, count));
            offset += 16;
        }
        if m >= 2 {
            centroids.push(Centroid::singleton(max));
        }

        digest.total_weight = centroids.iter().map(|c| c.count).sum();
        digest.centroids = centroids;
        digest.watermark = digest.centroids.len();
        Ok(digest)
    }

    /// Serializes the digest to the small wire format (`f32`/`i16`
    /// fields): a 30-byte header plus `(f32 count, f32 mean)` pairs for
    /// every centroid except the first and last.
    pub fn to_bytes_small(&mut self) -> Result<Vec<u8>> {
        self.compress()?;
        let m = self.centroids.len();

        let mut out = Vec::with_capacity(30 + 8 * m.saturating_sub(2));
        out.extend_from_slice(&TAG_SMALL.to_le_bytes());
        out.extend_from_slice(&self.min().to_le_bytes());
        out.extend_from_slice(&self.max().to_le_bytes());
        out.extend_from_slice(&(self.public_compression as f32).to_le_bytes());
        out.extend_from_slice(&(m as i16).to_le_bytes());
        out.extend_from_slice(&(m as i16).to_le_bytes());
        out.extend_from_slice(&(m as i16).to_le_bytes());

        if m > 2 {
            for c in &self.centroids[1..m - 1] {
                out.extend_from_slice(&(c.count as f32).to_le_bytes());
                out.extend_from_slice(&(c.mean as f32).to_le_bytes());
            }
        }
        Ok(out)
    }

    /// Deserializes a digest previously written by
    /// [`TDigest::to_bytes_small`].
    ///
    /// # Errors
    /// Returns [`SketchError::BadFormat`] for an unrecognized tag, or
    /// [`SketchError::BadInput`] for a truncated buffer.
    pub fn from_bytes_small(bytes: &[u8]) -> Result<Self> {
        validate_min_size(bytes.len(), 30)?;
        let tag = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if tag != TAG_SMALL {
            return Err(SketchError::BadFormat { tag });
        }
        let min = f64::from_le_bytes(bytes[4..12].try_into().unwrap());
        let max = f64::from_le_bytes(bytes[12..20].try_into().unwrap());
        let compression = f32::from_le_bytes(bytes[20..24].try_into().unwrap()) as f64;
        let m = i16::from_le_bytes(bytes[26..28].try_into().unwrap()) as usize;

        let expected = 30 + 8 * m.saturating_sub(2);
        validate_min_size(bytes.len(), expected)?;

        let mut digest = TDigest::new(compression);
        let mut centroids = Vec::with_capacity(m);
        if m >= 1 {
            centroids.push(Centroid::singleton(min));
        }
        let mut offset = 30;
        for _ in 0..m.saturating_sub(2) {
            let count = f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as f64;
            let mean = f32::from_le_bytes(bytes[offset + 4..offset + 8].try_into().unwrap()) as f64;
            centroids.push(Centroid::new(mean, count));
            offset += 8;
        }
        if m >= 2 {
            centroids.push(Centroid::singleton(max));
        }

        digest.total_weight = centroids.iter().map(|c| c.count).sum();
        digest.centroids = centroids;
        digest.watermark = digest.centroids.len();
        Ok(digest)
    }
}

impl Default for TDigest {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Sketch for TDigest {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        let _ = self.fit(*item);
    }

    fn estimate(&self) -> f64 {
        self.clone().quantile(0.5).unwrap_or(f64::NAN)
    }

    fn is_empty(&self) -> bool {
        TDigest::is_empty(self)
    }

    fn serialize(&self) -> Vec<u8> {
        self.clone().to_bytes().unwrap_or_default()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        TDigest::from_bytes(bytes)
    }
}

impl Mergeable for TDigest {
    fn merge(&mut self, other: &Self) -> Result<()> {
        TDigest::merge(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empirical_cdf(xs: &[f64], x: f64) -> f64 {
        let lt = xs.iter().filter(|&&v| v < x).count() as f64;
        let eq = xs.iter().filter(|&&v| v == x).count() as f64;
        (lt + eq / 2.0) / xs.len() as f64
    }

    #[test]
    fn new_clamps_minimum_compression() {
        let td = TDigest::new(1.0);
        assert_eq!(td.compression(), MIN_COMPRESSION);
    }

    #[test]
    fn rejects_nan() {
        let mut td = TDigest::new(100.0);
        assert!(td.fit(f64::NAN).is_err());
    }

    #[test]
    fn quantile_rejects_out_of_range() {
        let mut td = TDigest::new(100.0);
        td.fit(1.0).unwrap();
        assert!(td.quantile(-0.1).is_err());
        assert!(td.quantile(1.1).is_err());
    }

    #[test]
    fn cdf_rejects_non_finite() {
        let mut td = TDigest::new(100.0);
        td.fit(1.0).unwrap();
        assert!(td.cdf(f64::NAN).is_err());
        assert!(td.cdf(f64::INFINITY).is_err());
    }

    #[test]
    fn empty_digest_cdf_is_nan() {
        let mut td = TDigest::new(100.0);
        assert!(td.cdf(0.0).unwrap().is_nan());
        assert!(td.quantile(0.5).unwrap().is_nan());
    }

    #[test]
    fn single_centroid_cdf_is_step_function() {
        let mut td = TDigest::new(100.0);
        td.fit(5.0).unwrap();
        assert_eq!(td.cdf(4.0).unwrap(), 0.0);
        assert_eq!(td.cdf(5.0).unwrap(), 0.5);
        assert_eq!(td.cdf(6.0).unwrap(), 1.0);
        assert_eq!(td.quantile(0.0).unwrap(), 5.0);
        assert_eq!(td.quantile(1.0).unwrap(), 5.0);
    }

    #[test]
    fn small_dataset_matches_spec_scenario() {
        let data = [1.0, 2.0, 3.0, 5.0];
        let mut td = TDigest::new(100.0);
        td.fit_slice(&data).unwrap();

        assert_eq!(td.cdf(0.0).unwrap(), 0.0);
        assert_eq!(td.cdf(10.0).unwrap(), 1.0);
        assert_eq!(td.quantile(0.0).unwrap(), 1.0);
        assert_eq!(td.quantile(1.0).unwrap(), 5.0);

        for &v in &data {
            let ref_cdf = empirical_cdf(&data, v);
            assert!((td.cdf(v).unwrap() - ref_cdf).abs() < 1e-9, "v={v}");
        }
    }

    #[test]
    fn three_points_match_documented_cdf() {
        let mut td = TDigest::new(100.0);
        td.fit(1.0).unwrap();
        td.fit(2.0).unwrap();
        td.fit(3.0).unwrap();

        assert!((td.cdf(1.0).unwrap() - 1.0 / 6.0).abs() < 1e-9);
        assert!((td.cdf(1.0 + 1e-9).unwrap() - 1.0 / 3.0).abs() < 1e-6);
        assert!((td.cdf(2.0).unwrap() - 0.5).abs() < 1e-9);
        assert!((td.cdf(2.0 + 1e-9).unwrap() - 2.0 / 3.0).abs() < 1e-6);
        assert!((td.cdf(3.0).unwrap() - 5.0 / 6.0).abs() < 1e-9);
        assert!((td.cdf(3.0 + 1e-9).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn singletons_only_matches_empirical_functions() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut td = TDigest::new(100.0);
        td.fit_slice(&data).unwrap();
        td.compress().unwrap();
        assert_eq!(td.length(), 20);

        let mut x = data[0] - 0.1;
        while x <= data[data.len() - 1] + 0.1 {
            let got = td.cdf(x).unwrap();
            let want = empirical_cdf(&data, x);
            assert!((got - want).abs() < 1e-9, "x={x} got={got} want={want}");
            x += 0.01;
        }
    }

    #[test]
    fn issue_114_stress_exact_on_singletons() {
        let mut data = Vec::new();
        data.extend(std::iter::repeat(9000.0).take(2));
        data.extend(std::iter::repeat(3000.0).take(11));
        data.extend(std::iter::repeat(1000.0).take(26));

        let mut td = TDigest::new(100.0);
        td.fit_slice(&data).unwrap();

        let mut sorted = data.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let sample_quantile = |q: f64| -> f64 {
            let idx = ((q * sorted.len() as f64).ceil() as usize)
                .saturating_sub(1)
                .min(sorted.len() - 1);
            sorted[idx]
        };

        assert_eq!(td.quantile(0.9).unwrap(), sample_quantile(0.9));
        assert_eq!(td.quantile(0.95).unwrap(), sample_quantile(0.95));
    }

    #[test]
    fn merge_of_two_digests_preserves_weight() {
        let mut a = TDigest::new(100.0);
        let mut b = TDigest::new(100.0);
        for i in 0..500 {
            a.fit(i as f64).unwrap();
        }
        for i in 500..1000 {
            b.fit(i as f64).unwrap();
        }
        a.merge(&b).unwrap();
        assert_eq!(a.count(), 1000.0);
        a.check_weights().unwrap();
        let median = a.quantile(0.5).unwrap();
        assert!((median - 500.0).abs() < 25.0, "median={median}");
    }

    #[test]
    fn repeated_value_stress_round_trip_is_stable() {
        let pattern = [1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut data = Vec::new();
        for _ in 0..100 {
            data.extend_from_slice(&pattern);
        }

        let mut td = TDigest::new(100.0);
        td.fit_slice(&data).unwrap();
        td.compress().unwrap();
        let before = td.quantile(0.5).unwrap();

        let mut sorted = data.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let true_median = (sorted[data.len() / 2 - 1] + sorted[data.len() / 2]) / 2.0;
        assert!((before - true_median).abs() < 0.2);

        let mut fresh = TDigest::new(100.0);
        fresh.merge(&td).unwrap();
        let after = fresh.quantile(0.5).unwrap();
        assert!((before - after).abs() < 0.01);
    }

    #[test]
    fn check_weights_passes_on_uniform_chunked_inserts() {
        for &n in &[10usize, 100, 1000] {
            let mut td = TDigest::new(100.0);
            for chunk_start in (0..n).step_by(37) {
                let chunk: Vec<f64> = (chunk_start..(chunk_start + 37).min(n))
                    .map(|i| i as f64)
                    .collect();
                td.fit_slice(&chunk).unwrap();
            }
            td.compress().unwrap();
            td.check_weights().unwrap();
        }
    }

    #[test]
    fn verbose_round_trip() {
        let mut td = TDigest::new(100.0);
        for i in 0..2000 {
            td.fit(i as f64).unwrap();
        }
        let bytes = td.to_bytes().unwrap();
        assert_eq!(bytes.len(), td.byte_size().unwrap());

        let mut restored = TDigest::from_bytes(&bytes).unwrap();
        assert_eq!(restored.min(), td.min());
        assert_eq!(restored.max(), td.max());
        assert!((restored.quantile(0.5).unwrap() - td.quantile(0.5).unwrap()).abs() < 5.0);
    }

    #[test]
    fn small_round_trip() {
        let mut td = TDigest::new(100.0);
        for i in 0..2000 {
            td.fit(i as f64).unwrap();
        }
        let bytes = td.to_bytes_small().unwrap();
        assert_eq!(bytes.len(), td.small_byte_size().unwrap());

        let restored = TDigest::from_bytes_small(&bytes).unwrap();
        assert_eq!(restored.min(), td.min());
        assert_eq!(restored.max(), td.max());
    }

    #[test]
    fn unknown_encoding_tag_is_bad_format() {
        let bytes = vec![0xFFu8; 40];
        match TDigest::from_bytes(&bytes) {
            Err(SketchError::BadFormat { .. }) => {}
            other => panic!("expected BadFormat, got {other:?}"),
        }
    }

    #[test]
    fn merge_rejects_sample_log_mismatch() {
        let mut a = TDigest::new(100.0).with_sample_log();
        a.fit(1.0).unwrap();
        let mut b = TDigest::new(100.0);
        b.fit(2.0).unwrap();
        assert!(a.merge(&b).is_err());
    }
}
