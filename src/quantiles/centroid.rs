//! Centroids: the (mean, count) summaries that make up a digest

/// A cluster of samples summarized by its mean and total weight.
///
/// A centroid with `count == 1.0` is a *singleton*: its mass is treated
/// as concentrated exactly at `mean`. A centroid with `count > 1.0` has
/// its mass treated as spread uniformly over an interval bracketed by
/// its neighbors. `cdf`/`quantile` in [`super::digest`] rely on this
/// distinction to decide when interpolation is justified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    /// Mean of the values this centroid summarizes
    pub mean: f64,
    /// Number of values summarized (always `>= 1`)
    pub count: f64,
}

impl Centroid {
    /// Creates a centroid for a single value with the given weight.
    pub fn new(mean: f64, count: f64) -> Self {
        Centroid { mean, count }
    }

    /// Creates a singleton centroid (`count == 1.0`) for one sample.
    pub fn singleton(mean: f64) -> Self {
        Centroid { mean, count: 1.0 }
    }

    /// `true` if this centroid's mass is concentrated exactly at `mean`.
    pub fn is_singleton(&self) -> bool {
        self.count == 1.0
    }
}

/// Combines two centroids into one, weighting the mean by each
/// centroid's count. Returns `(0.0, 0.0)` when both counts are zero.
pub fn merge_centroids(a: Centroid, b: Centroid) -> Centroid {
    let count = a.count + b.count;
    if count == 0.0 {
        return Centroid::new(0.0, 0.0);
    }
    let mean = (a.count * a.mean + b.count * b.mean) / count;
    Centroid::new(mean, count)
}
