//! A mergeable streaming quantile sketch (t-digest) with tail-biased
//! accuracy, plus a log-scaled histogram and a Simple-N integer codec
//! for compressing its bin counts.
//!
//! - [`quantiles::TDigest`]: the primary sketch. Accepts samples one at
//!   a time or in bulk, and answers CDF/quantile queries with much
//!   tighter error near the tails than near the median, at a fixed
//!   memory budget. Mergeable across independently built digests.
//! - [`histogram::LogHistogram`] / [`histogram::SignedLogHistogram`]: a
//!   cheaper, fixed-size alternative when a compile-time-chosen
//!   relative precision is good enough.
//! - [`codec`]: a Simple-9/Simple-16-style variable-bit integer packer,
//!   used to compress histogram bin counts (or any other small
//!   non-negative integer stream) before it is written out.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod common;
pub mod histogram;
pub mod quantiles;

pub use common::{Mergeable, Result, Sketch, SketchError};
pub use histogram::{LogHistogram, SignedLogHistogram};
pub use quantiles::{ScaleFunction, TDigest};

/// Error types and result aliases for sketch operations
pub mod error {
    pub use crate::common::{Result, SketchError};
}
