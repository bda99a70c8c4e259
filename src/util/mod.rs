//! Utility types used throughout the library.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus [`BBox3f`]

mod error;
mod math;

pub use error::*;
pub use math::*;
