//! Quantile estimation: a mergeable streaming t-digest
//!
//! # Choosing a scale function
//!
//! [`TDigest::new`] defaults to `K3`, which gives the tightest bound on
//! tail error for a given compression `δ`. `K1`/`K2` trade some tail
//! accuracy for simpler error characteristics; `K0` produces uniformly
//! sized centroids and is mainly useful as a baseline when comparing
//! the others.
//!
//! # Example
//!
//! ```
//! use tdigest_sketch::TDigest;
//!
//! let mut td = TDigest::new(100.0);
//! for i in 1..=1000 {
//!     td.fit(i as f64).unwrap();
//! }
//!
//! println!("Median: {}", td.quantile(0.5).unwrap());
//! println!("p99: {}", td.quantile(0.99).unwrap());
//! ```

pub mod centroid;
mod digest;
pub mod scale;

pub use centroid::Centroid;
pub use digest::TDigest;
pub use scale::ScaleFunction;
