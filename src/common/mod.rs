//! Common utilities, traits, and errors shared by the digest, histogram,
//! and codec.

mod error;
mod traits;
pub mod validation;

pub use error::{Result, SketchError};
pub use traits::{Mergeable, Sketch};
