#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear algebra utilities.
pub mod linalg;

/// Transformation models that can be fitted to point matches.
pub mod model;

/// Points, point handles and point matches.
pub mod point;
