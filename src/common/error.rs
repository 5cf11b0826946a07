//! Error types for the digest, histogram, and codec

use std::fmt;

/// Errors that can occur during sketch operations
#[derive(Debug, Clone, PartialEq)]
pub enum SketchError {
    /// A value supplied by the caller violates a documented precondition:
    /// NaN to `fit`, non-finite to `cdf`, `q` outside `[0,1]` to
    /// `quantile`, malformed log-histogram bounds, a `logData` mismatch
    /// on merge, or a Simple-N value that overflows the codec's word width.
    BadInput {
        /// Parameter name
        param: String,
        /// Invalid value provided, formatted for display
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// A serialized buffer carries an encoding tag this crate doesn't
    /// recognize.
    BadFormat {
        /// The unrecognized tag read from the stream
        tag: u32,
    },

    /// An internal invariant failed. This indicates a bug in this crate,
    /// never a caller error, and once it fires the digest's observable
    /// state is undefined.
    InvariantViolated(String),
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::BadInput {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "bad input for '{}': value '{}' {}",
                    param, value, constraint
                )
            }
            SketchError::BadFormat { tag } => {
                write!(f, "unknown serialization encoding tag: {}", tag)
            }
            SketchError::InvariantViolated(msg) => {
                write!(f, "invariant violated: {}", msg)
            }
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias used throughout this crate
pub type Result<T> = std::result::Result<T, SketchError>;
