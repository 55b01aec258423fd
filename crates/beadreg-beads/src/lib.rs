#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod bead;
pub use bead::*;

mod correspondence;
pub use correspondence::*;
