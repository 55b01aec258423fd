#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use beadreg_3d as k3d;

#[doc(inline)]
pub use beadreg_beads as beads;

#[doc(inline)]
pub use beadreg_icp as icp;
