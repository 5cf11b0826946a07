//! Integration tests for the log-scaled histogram
//!
//! Tests verify:
//! - Construction rejects invalid bounds and epsilon
//! - Fast log2 approximation stays within its documented error bound
//! - CDF/quantile track the empirical distribution within epsilon
//! - Merge requires conformal histograms and sums bin counts exactly

use proptest::prelude::*;
use tdigest_sketch::histogram::{approx_log2, pow2, LogHistogram, SignedLogHistogram};

#[test]
fn rejects_non_positive_or_narrow_bounds() {
    assert!(LogHistogram::new(-1.0, 100.0, 0.01).is_err());
    assert!(LogHistogram::new(1.0, 1.5, 0.01).is_err());
}

#[test]
fn rejects_epsilon_outside_bounds() {
    assert!(LogHistogram::new(1.0, 1000.0, 1e-9).is_err());
    assert!(LogHistogram::new(1.0, 1000.0, 0.9).is_err());
}

#[test]
fn bin_count_scales_with_range_and_epsilon() {
    let narrow = LogHistogram::new(1.0, 2.0001, 0.01).unwrap();
    let wide = LogHistogram::new(1.0, 1_000_000.0, 0.01).unwrap();
    assert!(wide.bin_count() > narrow.bin_count());
}

#[test]
fn oversized_bin_count_is_rejected() {
    let result = LogHistogram::new(1.0, 1e300, 1e-6);
    assert!(result.is_err());
}

#[test]
fn quantile_tracks_uniform_distribution_within_epsilon() {
    let eps = 0.01;
    let mut h = LogHistogram::new(1.0, 1_000_000.0, eps).unwrap();
    for i in 1..=200_000 {
        h.fit(i as f64).unwrap();
    }

    let median = h.quantile(0.5).unwrap();
    let true_median = 100_000.0;
    assert!(
        (median - true_median).abs() / true_median < 5.0 * eps,
        "median={median}"
    );
}

#[test]
fn merge_requires_conformal_histograms_and_sums_exactly() {
    let mut a = LogHistogram::new(1.0, 1000.0, 0.01).unwrap();
    let mut b = LogHistogram::new(1.0, 1000.0, 0.01).unwrap();
    for i in 1..=1000 {
        a.fit(i as f64).unwrap();
    }
    for i in 1..=500 {
        b.fit((i * 2) as f64).unwrap();
    }

    let different_range = LogHistogram::new(1.0, 5000.0, 0.01).unwrap();
    assert!(a.merge(&different_range).is_err());

    let before = a.total();
    a.merge(&b).unwrap();
    assert_eq!(a.total(), before + b.total());
}

#[test]
fn signed_histogram_keeps_sign_information() {
    let mut h = SignedLogHistogram::new(1.0, 1_000_000.0, 0.01).unwrap();
    for i in 1..=1000 {
        h.fit(i as f64).unwrap();
        h.fit(-(i as f64)).unwrap();
    }

    assert_eq!(h.total(), 2000);
    assert!(h.cdf(-2_000_000.0) < 0.1);
    assert!(h.cdf(2_000_000.0) > 0.9);
}

proptest! {
    #[test]
    fn prop_approx_log2_within_error_bound(x in 0.001f64..1000.0) {
        let err = (approx_log2(x) - x.log2()).abs();
        prop_assert!(err < 0.011, "x={x} err={err}");
    }

    #[test]
    fn prop_pow2_round_trips_approx_log2(x in 0.001f64..100.0) {
        let back = pow2(approx_log2(x));
        prop_assert!((back - x).abs() < 1e-9 * x.max(1.0), "x={x} back={back}");
    }

    #[test]
    fn prop_cdf_is_monotone(values in prop::collection::vec(1.0f64..1_000_000.0, 10..500)) {
        let mut h = LogHistogram::new(1.0, 2_000_000.0, 0.01).unwrap();
        for &v in &values {
            h.fit(v).unwrap();
        }

        let mut last = 0.0;
        let mut x = 1.0;
        while x < 2_000_000.0 {
            let c = h.cdf(x);
            prop_assert!(c >= last - 1e-9, "cdf regressed at x={x}: {c} < {last}");
            last = c;
            x *= 1.7;
        }
    }
}
