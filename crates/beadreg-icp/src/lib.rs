#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod ambiguity;
pub use ambiguity::remove_ambiguous_matches;

mod convergence;
pub use convergence::*;

mod error;
pub use error::IcpError;

mod icp;
pub use icp::*;

mod identification;
pub use identification::*;
