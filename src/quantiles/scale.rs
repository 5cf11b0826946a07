//! Scale functions `k(q)` and their inverses
//!
//! A scale function maps a quantile position `q ∈ [0, 1]` to a scale
//! coordinate `k`, chosen so that the allowed centroid size shrinks near
//! the tails (`q` close to 0 or 1) and grows near the median. The
//! compression algorithm (`super::digest`) bounds every non-singleton
//! centroid to `k(qᵢ) − k(qᵢ₋₁) ≤ 1`; which scale function is in force
//! decides where that unit budget gets spent.
//!
//! Rust's closure-free enum dispatch (rather than the source's
//! code-generated family) keeps the compression inner loop
//! monomorphized on a single match rather than a trait object.

use std::f64::consts::PI;

const Q_LO: f64 = 1e-15;
const Q_HI: f64 = 1.0 - 1e-15;

fn clamp_q(q: f64) -> f64 {
    q.max(Q_LO).min(Q_HI)
}

/// One of the four scale families from Dunning's t-digest construction.
///
/// `K3` is the default used by [`super::digest::TDigest`]; `K0` produces
/// uniformly sized centroids and exists only for diagnostic comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleFunction {
    /// Uniform centroid sizes (`k(q) ∝ q`). Diagnostic only, does not
    /// bias accuracy toward the tails.
    K0,
    /// `k(q) ∝ asin(2q − 1)`. Centroid size ∝ `√(q(1−q))`.
    K1,
    /// `k(q) ∝ log(q / (1−q))`, normalized so the centroid count bound
    /// is independent of `n`.
    K2,
    /// Piecewise `log(2q)` / `−log(2(1−q))`, with a tighter tail bound
    /// than `K2`. Default scale.
    #[default]
    K3,
}

impl ScaleFunction {
    /// Precomputes the constant `N` such that `k(q, N) = N · f(q)` for
    /// this scale function, given compression `δ` and total weight `n`.
    pub fn normalizer(&self, delta: f64, n: f64) -> f64 {
        match self {
            ScaleFunction::K0 => delta,
            ScaleFunction::K1 => delta / (2.0 * PI),
            ScaleFunction::K2 => {
                let z = 4.0 * (n / delta).ln() + 24.0;
                1.0 / z
            }
            ScaleFunction::K3 => {
                let z = 4.0 * (n / delta).ln() + 21.0;
                1.0 / z
            }
        }
    }

    /// `k(q)` using the explicit `(δ, n)` pair. Equivalent to
    /// `k_norm(q, normalizer(delta, n))` but convenient at call sites
    /// that don't already have a cached normalizer.
    pub fn k(&self, q: f64, delta: f64, n: f64) -> f64 {
        self.k_norm(q, self.normalizer(delta, n))
    }

    /// `k(q, N)`: the scale coordinate for quantile `q` given a
    /// precomputed normalizer `N`.
    pub fn k_norm(&self, q: f64, norm: f64) -> f64 {
        let q = clamp_q(q);
        match self {
            ScaleFunction::K0 => norm * q,
            ScaleFunction::K1 => norm * (2.0 * q - 1.0).asin(),
            ScaleFunction::K2 => norm * (q / (1.0 - q)).ln(),
            ScaleFunction::K3 => {
                if q <= 0.5 {
                    norm * (2.0 * q).ln()
                } else {
                    norm * -((2.0 * (1.0 - q)).ln())
                }
            }
        }
    }

    /// Inverse of `k`, using the explicit `(δ, n)` pair.
    pub fn q(&self, k: f64, delta: f64, n: f64) -> f64 {
        self.q_norm(k, self.normalizer(delta, n))
    }

    /// `q(k, N)`: recovers the quantile position for scale coordinate
    /// `k` given a precomputed normalizer `N`.
    pub fn q_norm(&self, k: f64, norm: f64) -> f64 {
        let q = match self {
            ScaleFunction::K0 => k / norm,
            ScaleFunction::K1 => ((k / norm).sin() + 1.0) / 2.0,
            ScaleFunction::K2 => {
                let e = (k / norm).exp();
                e / (1.0 + e)
            }
            ScaleFunction::K3 => {
                let x = k / norm;
                if x <= 0.0 {
                    x.exp() / 2.0
                } else {
                    1.0 - (-x).exp() / 2.0
                }
            }
        };
        q.max(0.0).min(1.0)
    }

    /// Largest `Δq ≥ 0` such that a centroid straddling `q` may grow to
    /// `q + Δq` while still satisfying `k(q + Δq) − k(q) ≤ 1`, using the
    /// explicit `(δ, n)` pair.
    pub fn max_step(&self, q: f64, delta: f64, n: f64) -> f64 {
        self.max_step_norm(q, self.normalizer(delta, n))
    }

    /// `maxStep(q, N)` given a precomputed normalizer.
    pub fn max_step_norm(&self, q: f64, norm: f64) -> f64 {
        let q = clamp_q(q);
        let k0 = self.k_norm(q, norm);
        let q1 = self.q_norm(k0 + 1.0, norm);
        (q1 - q).max(0.0).min(1.0)
    }
}
